//! File formats read and written by the pipelines.

mod csv;
mod grid;
mod json;
#[cfg(feature = "parquet")]
mod parquet;
mod shp;
pub(crate) mod svg;

use std::path::Path;

use anyhow::{Context, Result, bail};
use polars::frame::DataFrame;

pub(crate) use csv::*;
pub use grid::{read_grid_axes, resolve_dataset_name};
pub use shp::{read_boundary_layer, read_county_layer, read_land_fraction_layer};

/// Reads an observation table (`GEOID`, `Year`, truth and model columns, optional `AgVar`).
pub fn read_observations(path: &Path) -> Result<DataFrame> {
    let df = read_table_csv(path)?;
    tracing::info!("[io] read {} observation rows x {} columns from {}", df.height(), df.width(), path.display());
    Ok(df)
}

/// Reads a previously written score table (key columns followed by one column per model).
pub fn read_score_table(path: &Path) -> Result<DataFrame> {
    read_table_csv(path)
        .with_context(|| format!("[io] Failed to read score table {}", path.display()))
}

/// Writes a table, choosing the format from the file extension (`csv`, `json`, `parquet`).
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    let ext = path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("csv") => write_csv(df, path)?,
        Some("json") => json::write_json(df, path)?,
        #[cfg(feature = "parquet")]
        Some("parquet") => parquet::write_parquet(df, path)?,
        _ => bail!("[io] Unsupported output format: {}", path.display()),
    }

    tracing::info!("[io] wrote {} rows to {}", df.height(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    #[test]
    fn csv_round_trip_keeps_geoid_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("scores.csv");
        let mut df = DataFrame::new(vec![
            Column::new("GEOID".into(), ["01001", "17031"]),
            Column::new("M".into(), [0.5, 1.5]),
        ]).unwrap();

        write_table(&mut df, &path).unwrap();
        let back = read_score_table(&path).unwrap();
        assert_eq!(back.column("GEOID").unwrap().str().unwrap().get(0), Some("01001"));
        assert_eq!(back.column("M").unwrap().f64().unwrap().get(1), Some(1.5));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let mut df = DataFrame::new(vec![Column::new("GEOID".into(), ["01001"])]).unwrap();
        assert!(write_table(&mut df, &tmp.path().join("scores.xlsx")).is_err());
    }
}
