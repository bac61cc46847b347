//! CSV reading operations.

use std::{fs::File, path::Path, sync::Arc};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, DataType, Field, Schema, SchemaRef}};

use crate::verify::{AGVAR_COL, GEOID_COL};

/// Reads an observation or score table from a CSV file at `path`.
/// Identifier and category columns are forced to strings so leading zeros survive.
pub(crate) fn read_table_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(key_column_schema()))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

/// Reads a table from CSV text.
#[cfg(test)]
pub(crate) fn read_table_csv_str(csv: &str) -> Result<DataFrame> {
    use polars::prelude::CsvReader;

    let options = CsvReadOptions::default()
        .with_has_header(true)
        .with_schema_overwrite(Some(key_column_schema()));
    CsvReader::new(std::io::Cursor::new(csv.as_bytes()))
        .with_options(options)
        .finish()
        .context("[io::csv::read] Failed to read CSV from string")
}

/// Schema overwrite for the key columns of observation and score tables.
fn key_column_schema() -> SchemaRef {
    Arc::new(Schema::from_iter([
        Field::new(GEOID_COL.into(), DataType::String),
        Field::new(AGVAR_COL.into(), DataType::String),
    ]))
}
