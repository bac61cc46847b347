//! Parquet output for score and weight tables.

mod write;

pub(crate) use write::*;
