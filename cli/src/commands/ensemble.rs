use std::path::PathBuf;

use anyhow::Result;

use crate::cli::{Cli, EnsembleArgs, EnsembleStat};

pub fn run(_cli: &Cli, args: &EnsembleArgs) -> Result<()> {
    let name = match args.stat {
        EnsembleStat::Spr => "spr",
        EnsembleStat::Rank => "rank",
        EnsembleStat::Crps => "crps",
    };
    let out_path = args.output.clone()
        .unwrap_or_else(|| PathBuf::from(format!("./ensemble_{name}.csv")));
    agverify::require_file_exists(&args.input)?;
    agverify::check_overwrite(&out_path, args.force)?;

    let mut config = super::verify_config(&args.config)?;
    if let Some(mean) = &args.ensemble_mean {
        config.ensemble_mean = mean.clone();
    }
    let observations = agverify::read_observations(&args.input)?;

    tracing::info!("[ensemble] computing {name} against {}", config.truth);
    let mut table = match args.stat {
        EnsembleStat::Spr => agverify::spread_skill(&observations, &config)?,
        EnsembleStat::Rank => agverify::rank_histogram(&observations, &config)?,
        EnsembleStat::Crps => agverify::crps(&observations, &config)?,
    };

    agverify::write_table(&mut table, &out_path)
}
