mod geo_id;
mod truth;

pub use geo_id::{GEOID_COL, GeoId};
pub use truth::TruthSource;
