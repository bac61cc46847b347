use std::path::{Path, PathBuf};

use agverify::{WeightConfig, grid};
use anyhow::{Context, Result, bail};

use crate::cli::{Cli, WeightsArgs};

pub fn run(_cli: &Cli, args: &WeightsArgs) -> Result<()> {
    let grid_path = match (&args.grid, &args.names, args.index) {
        (Some(path), _, _) => path.clone(),
        (None, Some(names), Some(index)) => {
            let data_dir = args.data_dir.clone().unwrap_or(".".into());
            agverify::resolve_dataset_name(names, index, &data_dir)?
        }
        _ => bail!("[weights] Pass a grid file, or --names with --index"),
    };
    agverify::require_file_exists(&grid_path)?;

    let dataset = grid_path.file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("[weights] Cannot derive a dataset name from {}", grid_path.display()))?;
    let out_dir = args.output.clone().unwrap_or(".".into());
    agverify::ensure_dir_exists(&out_dir)?;
    let out_path = out_dir.join(grid::weights_file_name(dataset));
    agverify::check_overwrite(&out_path, args.force)?;

    let mut config = match &args.config {
        Some(path) => WeightConfig::from_json_file(path)?,
        None => WeightConfig::default(),
    };
    if args.keep_intermediate { config.keep_intermediate = true }

    tracing::info!("[weights] dataset {dataset}");
    let axes = agverify::read_grid_axes(&grid_path)?;
    let counties = agverify::read_county_layer(&require(&args.counties)?, &args.id_field)?;
    let fracs = agverify::read_land_fraction_layer(&require(&args.fracs)?, &args.frac_field)?;

    let mut weights = agverify::compute_weights(&axes, &counties, &fracs, &config)?;
    agverify::write_table(&mut weights, &out_path)
}

fn require(path: &Path) -> Result<PathBuf> {
    agverify::require_file_exists(path)?;
    Ok(path.to_path_buf())
}
