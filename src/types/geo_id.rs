use std::{fmt, sync::Arc};

/// County identifier column shared by observation, score and weight tables.
pub const GEOID_COL: &str = "GEOID";

/// Width of a county GEOID (2-digit state FIPS + 3-digit county FIPS).
pub(crate) const COUNTY_ID_WIDTH: usize = 5;

/// Stable key for a county.
/// Keeps the GEOID text with its leading zeros, shared rather than repeatedly owned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeoId {
    id: Arc<str>, // e.g., "01001"
}

impl GeoId {
    /// Build a county GEOID from raw text, zero-padding to five characters.
    /// Identifiers read through a float column ("1001.0") lose their fractional suffix first.
    pub fn county(raw: &str) -> Self {
        Self::with_width(raw, COUNTY_ID_WIDTH)
    }

    /// Build a GEOID zero-padded to `width` characters.
    /// Identifiers already at least `width` long are kept as-is.
    pub fn with_width(raw: &str, width: usize) -> Self {
        let trimmed = raw.trim();
        let trimmed = trimmed
            .strip_suffix(".0")
            .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
            .unwrap_or(trimmed);

        let id = if trimmed.len() < width {
            format!("{trimmed:0>width$}")
        } else {
            trimmed.to_string()
        };

        Self { id: Arc::from(id) }
    }

    /// Get the identifier text.
    #[inline] pub fn id(&self) -> &str { &self.id }
}

impl fmt::Display for GeoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}
