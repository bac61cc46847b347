//! Verification statistics of model ensembles against GMFD/USDA truth.

mod config;
mod ensemble;
mod error;
mod metric;
mod ratio;
mod score;
mod table;
#[allow(clippy::module_inception)]
mod verify;

pub use config::VerifyConfig;
pub use ensemble::{crps, rank_histogram, spread_skill};
pub use error::VerifyError;
pub use metric::Metric;
pub use ratio::compose_ratio;
pub use table::normalize_geo_ids;
pub use verify::verify;

pub use crate::types::GEOID_COL;

/// Observation year column.
pub const YEAR_COL: &str = "Year";
/// Agricultural sub-variable column.
pub const AGVAR_COL: &str = "AgVar";
