use anyhow::Result;

use crate::cli::{Cli, RatioArgs};

pub fn run(_cli: &Cli, args: &RatioArgs) -> Result<()> {
    let out_path = args.output.clone().unwrap_or("./ratio.csv".into());
    agverify::check_overwrite(&out_path, args.force)?;

    let numerator = agverify::read_score_table(&args.numerator)?;
    let denominator = agverify::read_score_table(&args.denominator)?;

    tracing::info!("[ratio] {} / {}", args.numerator.display(), args.denominator.display());
    let mut ratio = agverify::compose_ratio(&numerator, &denominator)?;

    agverify::write_table(&mut ratio, &out_path)
}
