//! Ensemble statistics: spread-skill ratio, rank histogram and CRPS.
//!
//! All three treat the model columns as ensemble members. The column named by
//! [`VerifyConfig::ensemble_mean`] is the ensemble mean, never a member.

use anyhow::Result;
use polars::{frame::DataFrame, prelude::DataType};

use crate::verify::{
    VerifyConfig, VerifyError,
    metric::{mse, variance},
    score::ScoreTable,
    table::Groups,
};

/// Spread-skill ratio column.
pub const SPR_COL: &str = "SPR";
/// Continuous ranked probability score column.
pub const CRPS_COL: &str = "CRPS";

/// Spread-skill ratio per group: `sqrt(mean member variance) / RMSE(ensemble mean)`.
///
/// Member variances are taken over the group's years (population variance),
/// then averaged across members.
pub fn spread_skill(df: &DataFrame, config: &VerifyConfig) -> Result<DataFrame> {
    let groups = Groups::prepare(df, config)?;
    let mean_index = groups.model_index(&config.ensemble_mean)
        .ok_or_else(|| VerifyError::MissingEnsembleMean(config.ensemble_mean.clone()))?;
    let members = member_indices(&groups, config)?;
    tracing::info!("[verify::ensemble] spread-skill of {} members across {} groups", members.len(), groups.groups.len());

    let mut scores = ScoreTable::new(groups.by_agvar, vec![SPR_COL.to_string()]);
    for (key, data) in &groups.groups {
        let rmse = mse(&data.truth, &data.models[mean_index]).sqrt();
        let spread = members.iter()
            .map(|&i| variance(&data.models[i]))
            .sum::<f64>() / members.len() as f64;
        scores.push(key.clone(), vec![spread.sqrt() / rmse]);
    }

    scores.into_dataframe()
}

/// Rank histogram per group: column `rank_k` counts the years in which exactly
/// `k` members fell strictly below the truth.
pub fn rank_histogram(df: &DataFrame, config: &VerifyConfig) -> Result<DataFrame> {
    let groups = Groups::prepare(df, config)?;
    let members = member_indices(&groups, config)?;
    tracing::info!("[verify::ensemble] rank histogram of {} members across {} groups", members.len(), groups.groups.len());

    let names = (0..=members.len()).map(|k| format!("rank_{k}")).collect();
    let mut scores = ScoreTable::new(groups.by_agvar, names);
    for (key, data) in &groups.groups {
        let mut counts = vec![0.0; members.len() + 1];
        for (year, &truth) in data.truth.iter().enumerate() {
            let rank = members.iter()
                .filter(|&&i| data.models[i][year] < truth)
                .count();
            counts[rank] += 1.0;
        }
        scores.push(key.clone(), counts);
    }

    scores.into_dataframe_as(&DataType::UInt32)
}

/// Ensemble CRPS per group, averaged over the group's years.
pub fn crps(df: &DataFrame, config: &VerifyConfig) -> Result<DataFrame> {
    let groups = Groups::prepare(df, config)?;
    let members = member_indices(&groups, config)?;
    tracing::info!("[verify::ensemble] CRPS of {} members across {} groups", members.len(), groups.groups.len());

    let mut scores = ScoreTable::new(groups.by_agvar, vec![CRPS_COL.to_string()]);
    let mut ensemble = Vec::with_capacity(members.len());
    for (key, data) in &groups.groups {
        let mut total = 0.0;
        for year in 0..data.truth.len() {
            ensemble.clear();
            ensemble.extend(members.iter().map(|&i| data.models[i][year]));
            total += crps_row(&ensemble, data.truth[year]);
        }
        scores.push(key.clone(), vec![total / data.truth.len() as f64]);
    }

    scores.into_dataframe()
}

/// `mean|X - y| - 0.5 * mean|X - X'|` over all member pairs.
fn crps_row(members: &[f64], truth: f64) -> f64 {
    let m = members.len() as f64;
    let skill = members.iter().map(|x| (x - truth).abs()).sum::<f64>() / m;
    let spread = members.iter()
        .flat_map(|a| members.iter().map(move |b| (a - b).abs()))
        .sum::<f64>() / (m * m);
    skill - 0.5 * spread
}

/// Model indices of the ensemble members (every model but the ensemble mean).
fn member_indices(groups: &Groups, config: &VerifyConfig) -> Result<Vec<usize>, VerifyError> {
    let members = groups.models.iter()
        .enumerate()
        .filter(|(_, name)| **name != config.ensemble_mean)
        .map(|(i, _)| i)
        .collect::<Vec<_>>();
    if members.is_empty() {
        return Err(VerifyError::NoEnsembleMembers(config.ensemble_mean.clone()));
    }
    Ok(members)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{io::read_table_csv_str, types::TruthSource};

    const ENSEMBLE: &str = "\
GEOID,Year,GMFD,m1,m2,ensemble_mean
1001,2000,1.0,0.0,2.0,1.0
1001,2001,2.0,2.0,4.0,3.0
1001,2002,3.0,4.0,6.0,5.0
17031,2000,10.0,11.0,12.0,11.5
17031,2001,10.0,9.0,8.0,8.5
";

    fn config() -> VerifyConfig {
        VerifyConfig {
            year_min: 2000,
            year_max: 2002,
            min_valid_years: None,
            truth: TruthSource::Gmfd,
            group_by_agvar: false,
            models: None,
            ensemble_mean: "ensemble_mean".into(),
        }
    }

    #[test]
    fn spread_skill_ratio() {
        let df = read_table_csv_str(ENSEMBLE).unwrap();
        let out = spread_skill(&df, &config()).unwrap();
        let spr = out.column(SPR_COL).unwrap().f64().unwrap();

        // 01001: member variances 8/3 each; ensemble-mean errors 0, 1, 2 -> RMSE sqrt(5/3).
        assert_relative_eq!(spr.get(0).unwrap(), (8.0f64 / 3.0).sqrt() / (5.0f64 / 3.0).sqrt());
        // 17031: variances 1 and 4; errors 1.5, -1.5 -> RMSE 1.5.
        assert_relative_eq!(spr.get(1).unwrap(), 2.5f64.sqrt() / 1.5);
    }

    #[test]
    fn spread_skill_needs_ensemble_mean() {
        let df = read_table_csv_str(ENSEMBLE).unwrap();
        let config = VerifyConfig { ensemble_mean: "mean".into(), ..config() };
        let err = spread_skill(&df, &config).unwrap_err();
        assert!(matches!(err.downcast_ref::<VerifyError>(), Some(VerifyError::MissingEnsembleMean(name)) if name == "mean"));
    }

    #[test]
    fn spread_skill_needs_members() {
        let df = read_table_csv_str(ENSEMBLE).unwrap();
        let config = VerifyConfig { models: Some(vec!["ensemble_mean".into()]), ..config() };
        let err = spread_skill(&df, &config).unwrap_err();
        assert!(matches!(err.downcast_ref::<VerifyError>(), Some(VerifyError::NoEnsembleMembers(_))));
    }

    #[test]
    fn rank_counts_members_below_truth() {
        let df = read_table_csv_str(ENSEMBLE).unwrap();
        let out = rank_histogram(&df, &config()).unwrap();

        let names = out.get_column_names().into_iter().map(|n| n.to_string()).collect::<Vec<_>>();
        assert_eq!(names, vec!["GEOID", "rank_0", "rank_1", "rank_2"]);

        // 01001: truth 1 vs {0, 2} -> 1; 2 vs {2, 4} -> 0; 3 vs {4, 6} -> 0.
        let rank_0 = out.column("rank_0").unwrap().u32().unwrap();
        let rank_1 = out.column("rank_1").unwrap().u32().unwrap();
        let rank_2 = out.column("rank_2").unwrap().u32().unwrap();
        assert_eq!((rank_0.get(0), rank_1.get(0), rank_2.get(0)), (Some(2), Some(1), Some(0)));
        // 17031: 10 vs {11, 12} -> 0; 10 vs {9, 8} -> 2.
        assert_eq!((rank_0.get(1), rank_1.get(1), rank_2.get(1)), (Some(1), Some(0), Some(1)));
    }

    #[test]
    fn crps_of_point_ensemble_is_absolute_error() {
        assert_relative_eq!(crps_row(&[3.0], 1.0), 2.0);
        assert_relative_eq!(crps_row(&[3.0, 3.0], 1.0), 2.0);
        // mean|X - y| = 1, mean|X - X'| = (0 + 2 + 2 + 0) / 4 = 1
        assert_relative_eq!(crps_row(&[0.0, 2.0], 1.0), 0.5);
    }

    #[test]
    fn crps_averages_over_years() {
        let df = read_table_csv_str(ENSEMBLE).unwrap();
        let out = crps(&df, &config()).unwrap();
        let values = out.column(CRPS_COL).unwrap().f64().unwrap();

        // 01001 rows: (1 - 0.5), (1 - 0.5), (2 - 0.5)
        assert_relative_eq!(values.get(0).unwrap(), 2.5 / 3.0);
    }
}
