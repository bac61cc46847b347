use std::{fmt, str::FromStr};

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

/// Reference dataset a model series is verified against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TruthSource {
    /// Gridded meteorological reanalysis.
    Gmfd,
    /// Reported agricultural yields.
    #[default]
    Usda,
}

impl TruthSource {
    /// Name of the observation-table column holding this truth series.
    pub fn column(&self) -> &'static str {
        match self {
            TruthSource::Gmfd => "GMFD",
            TruthSource::Usda => "USDA",
        }
    }

    /// Truth columns never scored as models against this source.
    /// Against USDA the GMFD-driven series is itself a model; against GMFD, USDA is not.
    pub fn excluded_columns(&self) -> &'static [&'static str] {
        match self {
            TruthSource::Gmfd => &["GMFD", "USDA"],
            TruthSource::Usda => &["USDA"],
        }
    }
}

impl fmt::Display for TruthSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for TruthSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "gmfd" => Ok(TruthSource::Gmfd),
            "usda" => Ok(TruthSource::Usda),
            other => bail!("unknown truth source {other:?} (expected gmfd or usda)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!("GMFD".parse::<TruthSource>().unwrap(), TruthSource::Gmfd);
        assert_eq!("usda".parse::<TruthSource>().unwrap(), TruthSource::Usda);
        assert!("era5".parse::<TruthSource>().is_err());
    }

    #[test]
    fn excluded_columns_follow_truth() {
        assert_eq!(TruthSource::Gmfd.excluded_columns(), &["GMFD", "USDA"]);
        assert_eq!(TruthSource::Usda.excluded_columns(), &["USDA"]);
    }
}
