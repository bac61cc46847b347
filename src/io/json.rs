//! JSON output for score and weight tables.

use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerWriter, prelude::{JsonFormat, JsonWriter}};

/// Writes a Polars DataFrame to a JSON file at `path` as an array of row objects.
pub(crate) fn write_json(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::json] Failed to create JSON file: {}", path.display()))?;
    JsonWriter::new(BufWriter::new(file))
        .with_json_format(JsonFormat::Json)
        .finish(df)
        .with_context(|| format!("[io::json] Failed to write JSON to {:?}", path))
}
