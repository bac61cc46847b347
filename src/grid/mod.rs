//! Area-weighted attribution of climate-model grid cells to county polygons.

mod axes;
mod bbox;
mod config;
mod error;
mod layer;
mod weights;

pub use axes::GridAxes;
pub use config::WeightConfig;
pub use error::GridError;
pub use layer::{CountyLayer, LandFractionLayer};
pub use weights::{
    AREA_FRAC_COL, COUNTY_WEIGHT_COL, LAT_COL, LON_COL, WITHIN_COUNTY_WEIGHT_COL, compute_weights,
};

pub(crate) use bbox::BoundingBox;

/// Output file name of the weighting pipeline for a dataset.
pub fn weights_file_name(dataset: &str) -> String {
    format!("counties_{dataset}_weighted.csv")
}
