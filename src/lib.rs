#![doc = "agverify public API"]
mod common;
mod io;
mod types;

pub mod grid;
pub mod plot;
pub mod verify;

#[doc(inline)]
pub use types::{GEOID_COL, GeoId, TruthSource};

#[doc(inline)]
pub use verify::{
    Metric, VerifyConfig, VerifyError, compose_ratio, crps, rank_histogram, spread_skill, verify,
};

#[doc(inline)]
pub use grid::{GridAxes, GridError, WeightConfig, compute_weights};

#[doc(inline)]
pub use plot::{Choropleth, ColorRamp};

#[doc(inline)]
pub use io::{
    read_boundary_layer, read_county_layer, read_grid_axes, read_land_fraction_layer, read_observations,
    read_score_table, resolve_dataset_name, write_table,
};

#[doc(inline)]
pub use common::{check_overwrite, ensure_dir_exists, require_file_exists};
