//! Preparation of observation tables: identifier normalization, year filtering,
//! sparse-county removal, missing-value removal and grouping.

use std::collections::BTreeMap;

use anyhow::Result;
use polars::prelude::*;

use crate::{
    types::GeoId,
    verify::{AGVAR_COL, GEOID_COL, VerifyConfig, VerifyError, YEAR_COL},
};

// Per-county count of missing truth values.
const MISSING_COL: &str = "__missing";

/// Key of one scored group: optional sub-variable, then county.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct GroupKey {
    pub(crate) agvar: Option<String>,
    pub(crate) geo_id: GeoId,
}

impl std::fmt::Display for GroupKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.agvar {
            Some(agvar) => write!(f, "({agvar}, {})", self.geo_id),
            None => write!(f, "{}", self.geo_id),
        }
    }
}

/// Complete (no missing values) rows of one group.
#[derive(Debug, Clone, Default)]
pub(crate) struct GroupData {
    pub(crate) truth: Vec<f64>,
    /// One series per model, aligned with `truth`.
    pub(crate) models: Vec<Vec<f64>>,
}

/// Observation rows grouped by key, ready for scoring.
#[derive(Debug)]
pub(crate) struct Groups {
    pub(crate) by_agvar: bool,
    pub(crate) models: Vec<String>,
    pub(crate) groups: BTreeMap<GroupKey, GroupData>,
}

impl Groups {
    /// Run the preparation steps of `config` over an observation table.
    pub(crate) fn prepare(df: &DataFrame, config: &VerifyConfig) -> Result<Self> {
        config.validate()?;

        let truth_col = config.truth.column();
        for required in [GEOID_COL, YEAR_COL, truth_col] {
            require_column(df, required)?;
        }
        if config.group_by_agvar {
            require_column(df, AGVAR_COL)?;
        }

        let models = resolve_models(df, config)?;

        let df = normalize_geo_ids(df)?;
        let df = filter_years(df, config.year_min, config.year_max)?;
        tracing::debug!("[verify] {} rows within {}..={}", df.height(), config.year_min, config.year_max);

        let mut keys = Vec::with_capacity(2);
        if config.group_by_agvar {
            keys.push(col(AGVAR_COL).cast(DataType::String));
        }
        keys.push(col(GEOID_COL));

        // Truth first, then models; NaN counts as missing.
        let values = std::iter::once(truth_col)
            .chain(models.iter().map(String::as_str))
            .collect::<Vec<_>>();
        let rows = df.lazy()
            .with_columns(values.iter()
                .map(|&name| col(name).cast(DataType::Float64).fill_nan(lit(NULL)).alias(name))
                .collect::<Vec<_>>())
            .filter(col(GEOID_COL).is_not_null());

        let rows = match config.max_missing_years() {
            Some(max_missing) => {
                let missing = rows.clone()
                    .group_by([col(GEOID_COL)])
                    .agg([col(truth_col).is_null().sum().alias(MISSING_COL)])
                    .collect()?;
                let sparse = missing.clone().lazy()
                    .filter(col(MISSING_COL).gt(lit(max_missing)))
                    .collect()?
                    .height();
                if sparse > 0 {
                    tracing::info!("[verify] dropping {sparse} counties with too few {truth_col} years");
                }
                rows.inner_join(missing.lazy(), col(GEOID_COL), col(GEOID_COL))
                    .filter(col(MISSING_COL).lt_eq(lit(max_missing)))
            }
            None => rows,
        };

        let complete = keys.iter().cloned()
            .chain(values.iter().map(|&name| col(name)))
            .fold(lit(true), |all, expr| all.and(expr.is_not_null()));
        let rows = rows.collect()?;
        let kept = rows.clone().lazy().filter(complete).collect()?;
        let dropped = rows.height() - kept.height();

        let grouped = kept.lazy()
            .group_by(keys)
            .agg(values.iter().map(|&name| col(name)).collect::<Vec<_>>())
            .collect()?;
        tracing::debug!("[verify] dropped {dropped} incomplete rows; {} groups remain", grouped.height());

        let groups = collect_groups(&grouped, config.group_by_agvar, &values)?;
        Ok(Self { by_agvar: config.group_by_agvar, models, groups })
    }

    /// Index of a model column, if present.
    pub(crate) fn model_index(&self, name: &str) -> Option<usize> {
        self.models.iter().position(|model| model == name)
    }
}

/// Read the aggregated lists of each group back into per-group series.
/// `values` names the truth column first, then the models.
fn collect_groups(grouped: &DataFrame, by_agvar: bool, values: &[&str]) -> Result<BTreeMap<GroupKey, GroupData>> {
    let geo_ids = grouped.column(GEOID_COL)?.str()?;
    let agvars = if by_agvar { Some(grouped.column(AGVAR_COL)?.str()?) } else { None };
    let lists = values.iter()
        .map(|&name| Ok(grouped.column(name)?.list()?))
        .collect::<Result<Vec<_>>>()?;

    let mut groups = BTreeMap::new();
    for row in 0..grouped.height() {
        let Some(geo_id) = geo_ids.get(row) else { continue };
        let agvar = agvars.and_then(|agvars| agvars.get(row).map(str::to_string));

        let mut series = lists.iter()
            .map(|list| list_values(list, row))
            .collect::<Result<Vec<_>>>()?;
        let truth = series.remove(0);
        groups.insert(GroupKey { agvar, geo_id: GeoId::county(geo_id) }, GroupData { truth, models: series });
    }
    Ok(groups)
}

fn list_values(list: &ListChunked, row: usize) -> Result<Vec<f64>> {
    Ok(match list.get_as_series(row) {
        Some(series) => series.f64()?.into_no_null_iter().collect(),
        None => Vec::new(),
    })
}

/// Zero-pad every `GEOID` to five characters (integers are formatted first).
pub fn normalize_geo_ids(df: &DataFrame) -> Result<DataFrame> {
    let ids = require_column(df, GEOID_COL)?.cast(&DataType::String)?;
    let padded = ids.str()?.into_iter()
        .map(|id| id.map(|id| GeoId::county(id).id().to_string()))
        .collect::<StringChunked>()
        .with_name(GEOID_COL.into());

    let mut df = df.clone();
    df.replace_or_add(GEOID_COL.into(), padded.into_series())?;
    Ok(df)
}

/// Keep rows with `year_min <= Year <= year_max`.
pub(crate) fn filter_years(df: DataFrame, year_min: i32, year_max: i32) -> Result<DataFrame> {
    let year = col(YEAR_COL).cast(DataType::Int64);
    Ok(df.lazy()
        .filter(year.clone().gt_eq(lit(year_min as i64)).and(year.lt_eq(lit(year_max as i64))))
        .collect()?)
}

/// Model columns to score: the explicit list, or every numeric column that is
/// neither a key nor excluded by the truth source.
fn resolve_models(df: &DataFrame, config: &VerifyConfig) -> Result<Vec<String>> {
    let excluded = config.truth.excluded_columns();
    let models = match &config.models {
        Some(models) => {
            for model in models {
                if model == config.truth.column() {
                    return Err(VerifyError::TruthInModels(model.clone()).into());
                }
                require_column(df, model)?;
            }
            models.clone()
        }
        None => df.get_columns().iter()
            .filter(|column| {
                let name = column.name().as_str();
                ![GEOID_COL, YEAR_COL, AGVAR_COL].contains(&name)
                    && !excluded.contains(&name)
                    && is_numeric(column.dtype())
            })
            .map(|column| column.name().to_string())
            .collect(),
    };

    if models.is_empty() {
        return Err(VerifyError::NoModels.into());
    }
    Ok(models)
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(dtype,
        DataType::Float64 | DataType::Float32
        | DataType::Int64 | DataType::Int32 | DataType::Int16 | DataType::Int8
        | DataType::UInt64 | DataType::UInt32 | DataType::UInt16 | DataType::UInt8)
}

pub(crate) fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, VerifyError> {
    df.column(name).map_err(|_| VerifyError::MissingColumn(name.to_string()))
}
