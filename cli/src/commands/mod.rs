pub mod ensemble;
pub mod plot;
pub mod ratio;
pub mod verify;
pub mod weights;

use agverify::VerifyConfig;
use anyhow::Result;

use crate::cli::{ConfigArgs, Preset};

/// Resolve verification settings: JSON file or preset, then flag overrides.
pub(crate) fn verify_config(args: &ConfigArgs) -> Result<VerifyConfig> {
    let mut config = match &args.config {
        Some(path) => VerifyConfig::from_json_file(path)?,
        None => match args.preset {
            Preset::Agvar => VerifyConfig::agvar(),
            Preset::YieldUsda => VerifyConfig::yield_usda(),
            Preset::YieldGmfd => VerifyConfig::yield_gmfd(),
        },
    };

    if let Some(truth) = args.truth { config.truth = truth }
    if let Some(year_min) = args.year_min { config.year_min = year_min }
    if let Some(year_max) = args.year_max { config.year_max = year_max }
    if let Some(min) = args.min_valid_years { config.min_valid_years = Some(min) }
    if args.no_min_valid_years { config.min_valid_years = None }
    if args.by_agvar { config.group_by_agvar = true }
    if !args.models.is_empty() { config.models = Some(args.models.clone()) }

    config.validate()?;
    tracing::debug!("[cli] verification settings: {config:?}");
    Ok(config)
}
