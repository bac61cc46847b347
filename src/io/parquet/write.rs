use std::{fs::File, io::BufWriter, path::Path};

use anyhow::{Context, Result};
use polars::{frame::DataFrame, prelude::ParquetWriter};

/// Writes a Polars DataFrame to a Parquet file at `path`.
pub(crate) fn write_parquet(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::parquet::write] Failed to create Parquet file: {}", path.display()))?;
    ParquetWriter::new(BufWriter::new(file))
        .finish(df)
        .with_context(|| format!("[io::parquet::write] Failed to write Parquet to {:?}", path))?;
    Ok(())
}
