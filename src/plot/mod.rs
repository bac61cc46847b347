//! County choropleth maps of score tables.

mod choropleth;
mod ramp;

pub use choropleth::Choropleth;
pub use ramp::ColorRamp;
