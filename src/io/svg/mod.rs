//! SVG writing operations for choropleth export.

mod color;
mod path;
mod writer;

pub(crate) use color::*;
pub(crate) use path::*;
pub(crate) use writer::*;
