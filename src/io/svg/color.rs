//! Color mapping utilities for SVG visualization.

use std::fmt;

/// Simple RGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Rgb {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
}

impl fmt::Display for Rgb {
    /// Format as CSS hex: #rrggbb
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Fill for counties without a value.
pub(crate) const MISSING_FILL: Rgb = Rgb { r: 211, g: 211, b: 211 };

/// Interpolate a piecewise-linear ramp at `t` in [0.0, 1.0].
/// Stops are evenly spaced; `t` outside the range is clamped, NaN maps to the missing fill.
pub(crate) fn ramp_color(stops: &[Rgb], t: f64) -> Rgb {
    if !t.is_finite() || stops.is_empty() { return MISSING_FILL }
    if stops.len() == 1 { return stops[0] }

    let t = t.clamp(0.0, 1.0);
    let scaled = t * (stops.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(stops.len() - 2);
    let frac = scaled - i as f64;

    let lerp = |a: u8, b: u8| -> u8 {
        (a as f64 + (b as f64 - a as f64) * frac)
            .round()
            .clamp(0.0, 255.0) as u8
    };

    let (lo, hi) = (stops[i], stops[i + 1]);
    Rgb { r: lerp(lo.r, hi.r), g: lerp(lo.g, hi.g), b: lerp(lo.b, hi.b) }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BW: [Rgb; 2] = [Rgb { r: 0, g: 0, b: 0 }, Rgb { r: 255, g: 255, b: 255 }];

    #[test]
    fn endpoints_and_midpoint() {
        assert_eq!(ramp_color(&BW, 0.0), BW[0]);
        assert_eq!(ramp_color(&BW, 1.0), BW[1]);
        assert_eq!(ramp_color(&BW, 0.5), Rgb { r: 128, g: 128, b: 128 });
    }

    #[test]
    fn out_of_range_is_clamped() {
        assert_eq!(ramp_color(&BW, -3.0), BW[0]);
        assert_eq!(ramp_color(&BW, 7.0), BW[1]);
    }

    #[test]
    fn nan_is_missing() {
        assert_eq!(ramp_color(&BW, f64::NAN), MISSING_FILL);
    }

    #[test]
    fn formats_as_hex() {
        assert_eq!(Rgb { r: 8, g: 81, b: 156 }.to_string(), "#08519c");
    }
}
