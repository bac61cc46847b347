use std::{fmt, str::FromStr};

use anyhow::bail;
use serde::{Deserialize, Serialize};

use crate::io::svg::{Rgb, ramp_color};

/// Built-in color ramps for choropleths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorRamp {
    /// Light to dark blue, for errors and variances.
    #[default]
    Sequential,
    /// Red through white to blue, for correlations and ratios centered on a reference.
    Diverging,
}

const BLUES: [Rgb; 5] = [
    Rgb { r: 239, g: 243, b: 255 },
    Rgb { r: 189, g: 215, b: 231 },
    Rgb { r: 107, g: 174, b: 214 },
    Rgb { r: 49, g: 130, b: 189 },
    Rgb { r: 8, g: 81, b: 156 },
];

const RED_BLUE: [Rgb; 5] = [
    Rgb { r: 202, g: 0, b: 32 },
    Rgb { r: 244, g: 165, b: 130 },
    Rgb { r: 247, g: 247, b: 247 },
    Rgb { r: 146, g: 197, b: 222 },
    Rgb { r: 5, g: 113, b: 176 },
];

impl ColorRamp {
    fn stops(&self) -> &'static [Rgb] {
        match self {
            ColorRamp::Sequential => &BLUES,
            ColorRamp::Diverging => &RED_BLUE,
        }
    }

    /// Color of `value` on the `[vmin, vmax]` scale; values outside are clamped.
    pub(crate) fn color(&self, value: f64, vmin: f64, vmax: f64) -> Rgb {
        let span = vmax - vmin;
        let t = if span > 0.0 { (value - vmin) / span } else { 0.5 };
        ramp_color(self.stops(), if value.is_finite() { t } else { f64::NAN })
    }
}

impl fmt::Display for ColorRamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ColorRamp::Sequential => "sequential",
            ColorRamp::Diverging => "diverging",
        })
    }
}

impl FromStr for ColorRamp {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sequential" | "blues" => Ok(ColorRamp::Sequential),
            "diverging" | "rdbu" => Ok(ColorRamp::Diverging),
            _ => bail!("unknown color ramp {s:?}; expected sequential or diverging"),
        }
    }
}
