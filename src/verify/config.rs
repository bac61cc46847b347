use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::{types::TruthSource, verify::VerifyError};

/// Parameters of a verification run.
///
/// The presets reproduce the defaults of the sub-variable (`agvar`) and crop-yield
/// (`yield_usda`, `yield_gmfd`) analyses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyConfig {
    /// First year of the sample (inclusive).
    pub year_min: i32,
    /// Last year of the sample (inclusive).
    pub year_max: i32,
    /// Minimum number of valid truth years a county needs to be scored.
    /// Counties with more than `year_max - year_min - min_valid_years` missing truth
    /// values are dropped. `None` disables the check.
    pub min_valid_years: Option<i32>,
    /// Truth dataset to verify against.
    pub truth: TruthSource,
    /// Group by (`AgVar`, `GEOID`) instead of `GEOID` alone.
    pub group_by_agvar: bool,
    /// Explicit model columns; every numeric non-key, non-truth column when `None`.
    pub models: Option<Vec<String>>,
    /// Name of the ensemble-mean column used by the ensemble statistics.
    pub ensemble_mean: String,
}

impl Default for VerifyConfig {
    fn default() -> Self { Self::yield_usda() }
}

impl VerifyConfig {
    /// Growing-degree-day / precipitation variables against GMFD, grouped by `AgVar`.
    pub fn agvar() -> Self {
        Self {
            year_min: 1956,
            year_max: 2005,
            min_valid_years: None,
            truth: TruthSource::Gmfd,
            group_by_agvar: true,
            models: None,
            ensemble_mean: "ensemble_mean".to_string(),
        }
    }

    /// Crop yields against reported USDA yields.
    pub fn yield_usda() -> Self {
        Self {
            year_min: 1950,
            year_max: 2005,
            min_valid_years: Some(40),
            truth: TruthSource::Usda,
            group_by_agvar: false,
            models: None,
            ensemble_mean: "ensemble_mean".to_string(),
        }
    }

    /// Crop yields against yields driven by GMFD, which starts in 1956.
    pub fn yield_gmfd() -> Self {
        Self {
            year_min: 1956,
            truth: TruthSource::Gmfd,
            ..Self::yield_usda()
        }
    }

    /// Load a configuration from a JSON file; absent fields take the `yield_usda` defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("[verify::config] Failed to read {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("[verify::config] Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the year range is non-empty.
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.year_min > self.year_max {
            return Err(VerifyError::EmptyYearRange { min: self.year_min, max: self.year_max });
        }
        Ok(())
    }

    /// Largest tolerated count of missing truth values per county, if the check is enabled.
    pub fn max_missing_years(&self) -> Option<i64> {
        self.min_valid_years
            .map(|min| self.year_max as i64 - self.year_min as i64 - min as i64)
    }
}
