use std::{fs, path::Path};

use anyhow::{Context, Result};
use geo::{Coord, Rect};
use serde::{Deserialize, Serialize};

/// Parameters of the grid-to-county weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightConfig {
    /// Southern bound of retained cell centers (exclusive, degrees north).
    pub lat_min: f64,
    /// Northern bound (exclusive).
    pub lat_max: f64,
    /// Western bound (exclusive, degrees east in -180..180).
    pub lon_min: f64,
    /// Eastern bound (exclusive).
    pub lon_max: f64,
    /// Overlay pieces with a planar area at or below this (square degrees) are dropped.
    pub area_threshold: f64,
    /// Also emit the `area_frac` and `county_weight` intermediates.
    pub keep_intermediate: bool,
}

impl Default for WeightConfig {
    /// Contiguous United States.
    fn default() -> Self {
        Self {
            lat_min: 24.0,
            lat_max: 50.0,
            lon_min: -125.0,
            lon_max: -66.0,
            area_threshold: 1e-10,
            keep_intermediate: false,
        }
    }
}

impl WeightConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("[grid::config] Failed to read {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("[grid::config] Failed to parse {}", path.display()))
    }

    /// Bounding box of retained cell centers.
    pub(crate) fn bbox(&self) -> Rect<f64> {
        Rect::new(
            Coord { x: self.lon_min, y: self.lat_min },
            Coord { x: self.lon_max, y: self.lat_max },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("weights.json");
        fs::write(&path, r#"{"lat_max": 49.5, "keep_intermediate": true}"#).unwrap();

        let config = WeightConfig::from_json_file(&path).unwrap();
        assert_eq!(config.lat_max, 49.5);
        assert_eq!(config.lon_min, -125.0);
        assert_eq!(config.area_threshold, 1e-10);
        assert!(config.keep_intermediate);
    }
}
