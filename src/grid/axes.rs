use geo::{Coord, Rect};

use crate::grid::GridError;

/// Relative tolerance when checking that axis spacing is uniform.
const SPACING_TOLERANCE: f64 = 1e-6;

/// Latitude/longitude axes of a regular climate-model grid (degrees).
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxes {
    lat: Vec<f64>,
    lon: Vec<f64>,
    lat_step: f64,
    lon_step: f64,
}

/// One grid cell: its indices into the full axes and its footprint in -180..180 longitude.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GridCell {
    pub(crate) lat_index: usize,
    pub(crate) lon_index: usize,
    pub(crate) rect: Rect<f64>,
}

impl GridAxes {
    /// Build axes; cell size is taken from the first difference along each axis.
    pub fn new(lat: Vec<f64>, lon: Vec<f64>) -> Result<Self, GridError> {
        let lat_step = axis_step("latitude", &lat)?;
        let lon_step = axis_step("longitude", &lon)?;
        Ok(Self { lat, lon, lat_step, lon_step })
    }

    #[inline] pub fn lat(&self) -> &[f64] { &self.lat }

    #[inline] pub fn lon(&self) -> &[f64] { &self.lon }

    /// Absolute latitude spacing.
    #[inline] pub fn lat_step(&self) -> f64 { self.lat_step }

    /// Absolute longitude spacing.
    #[inline] pub fn lon_step(&self) -> f64 { self.lon_step }

    /// Cells whose centers fall strictly inside `bbox` (longitude in -180..180),
    /// longitude-major then latitude.
    pub(crate) fn cells_within(&self, bbox: &Rect<f64>) -> Vec<GridCell> {
        let (half_lat, half_lon) = (self.lat_step / 2.0, self.lon_step / 2.0);

        let lat_inside = self.lat.iter().enumerate()
            .filter(|&(_, &lat)| lat > bbox.min().y && lat < bbox.max().y)
            .collect::<Vec<_>>();

        self.lon.iter().enumerate()
            .map(|(j, &lon)| (j, normalize_lon(lon)))
            .filter(|&(_, lon)| lon > bbox.min().x && lon < bbox.max().x)
            .flat_map(|(j, lon)| lat_inside.iter().map(move |&(i, &lat)| GridCell {
                lat_index: i,
                lon_index: j,
                rect: Rect::new(
                    Coord { x: lon - half_lon, y: lat - half_lat },
                    Coord { x: lon + half_lon, y: lat + half_lat },
                ),
            }))
            .collect()
    }
}

/// Map a longitude in the 0..360 convention onto -180..180.
pub(crate) fn normalize_lon(lon: f64) -> f64 {
    if lon > 180.0 { lon - 360.0 } else { lon }
}

fn axis_step(axis: &'static str, values: &[f64]) -> Result<f64, GridError> {
    if values.len() < 2 {
        return Err(GridError::TooFewCoordinates { axis, len: values.len() });
    }
    if let Some(index) = values.iter().position(|v| !v.is_finite()) {
        return Err(GridError::NonFiniteCoordinate { axis, index });
    }

    let step = (values[1] - values[0]).abs();
    if step == 0.0 {
        return Err(GridError::ZeroStep { axis });
    }

    let uniform = values.windows(2)
        .all(|pair| ((pair[1] - pair[0]).abs() - step).abs() <= SPACING_TOLERANCE * step);
    if !uniform {
        tracing::warn!("[grid] {axis} spacing is not uniform; using the first step {step} for every cell");
    }

    Ok(step)
}
