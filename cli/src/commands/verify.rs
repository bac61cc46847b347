use std::path::PathBuf;

use anyhow::Result;

use crate::cli::{Cli, VerifyArgs};

pub fn run(_cli: &Cli, args: &VerifyArgs) -> Result<()> {
    let out_path = args.output.clone()
        .unwrap_or_else(|| PathBuf::from(format!("./scores_{}.csv", args.metric)));
    agverify::require_file_exists(&args.input)?;
    agverify::check_overwrite(&out_path, args.force)?;

    let config = super::verify_config(&args.config)?;
    let observations = agverify::read_observations(&args.input)?;

    tracing::info!("[verify] scoring {} against {}", args.metric, config.truth);
    let mut scores = agverify::verify(&observations, args.metric, &config)?;

    agverify::write_table(&mut scores, &out_path)
}
