//! Grid coordinate inputs: JSON axis files, NetCDF datasets and name-list lookup.

use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;

use crate::grid::GridAxes;

/// Reads the latitude/longitude axes of a gridded dataset.
///
/// `.json` files hold `{"lat": [...], "lon": [...]}`. NetCDF files (`.nc`, `.nc4`)
/// are read through their `lat`/`lon` coordinate variables when the `netcdf`
/// feature is enabled.
pub fn read_grid_axes(path: &Path) -> Result<GridAxes> {
    match extension(path).as_deref() {
        Some("json") => read_grid_axes_json(path),
        Some("nc") | Some("nc4") => read_grid_axes_netcdf(path),
        _ => bail!("[io::grid] Unsupported grid file type: {}", path.display()),
    }
}

/// Look up the dataset at 1-based `index` in a name-list file (one file name per line)
/// and resolve it against `data_dir`.
pub fn resolve_dataset_name(names_file: &Path, index: usize, data_dir: &Path) -> Result<PathBuf> {
    let names = fs::read_to_string(names_file)
        .with_context(|| format!("[io::grid] Failed to read name list {}", names_file.display()))?;
    let names = names.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    ensure!(index >= 1 && index <= names.len(),
        "[io::grid] Dataset index {} out of range (name list has {} entries)", index, names.len());

    Ok(data_dir.join(names[index - 1]))
}

fn extension(path: &Path) -> Option<String> {
    path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase)
}

#[derive(Deserialize)]
struct AxesFile {
    lat: Vec<f64>,
    lon: Vec<f64>,
}

fn read_grid_axes_json(path: &Path) -> Result<GridAxes> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("[io::grid] Failed to read grid file {}", path.display()))?;
    let axes: AxesFile = serde_json::from_str(&text)
        .with_context(|| format!("[io::grid] Failed to parse grid axes from {}", path.display()))?;
    Ok(GridAxes::new(axes.lat, axes.lon)?)
}

#[cfg(feature = "netcdf")]
fn read_grid_axes_netcdf(path: &Path) -> Result<GridAxes> {
    let file = netcdf::open(path)
        .with_context(|| format!("[io::grid] Failed to open NetCDF file {}", path.display()))?;

    let read_axis = |name: &str| -> Result<Vec<f64>> {
        let var = file.variable(name)
            .with_context(|| format!("[io::grid] Missing coordinate variable {name:?} in {}", path.display()))?;
        var.get_values::<f64, _>(..)
            .with_context(|| format!("[io::grid] Failed to read coordinate variable {name:?}"))
    };

    Ok(GridAxes::new(read_axis("lat")?, read_axis("lon")?)?)
}

#[cfg(not(feature = "netcdf"))]
fn read_grid_axes_netcdf(path: &Path) -> Result<GridAxes> {
    bail!("[io::grid] Reading {} requires the `netcdf` feature", path.display())
}
