use anyhow::Result;
use polars::frame::DataFrame;

use crate::verify::{
    Metric, VerifyConfig,
    score::ScoreTable,
    table::Groups,
};

/// Score every model column of `df` against the configured truth with `metric`.
///
/// Returns one row per county (or per (`AgVar`, county) pair when grouping by
/// sub-variable), sorted by key, with one `f64` column per model.
pub fn verify(df: &DataFrame, metric: Metric, config: &VerifyConfig) -> Result<DataFrame> {
    let groups = Groups::prepare(df, config)?;
    tracing::info!("[verify] {} of {} models across {} groups against {}",
        metric, groups.models.len(), groups.groups.len(), config.truth);

    let mut scores = ScoreTable::new(groups.by_agvar, groups.models.clone());
    for (key, data) in &groups.groups {
        let row = data.models.iter()
            .map(|model| metric.compute(&data.truth, model))
            .collect();
        scores.push(key.clone(), row);
    }

    scores.into_dataframe()
}
