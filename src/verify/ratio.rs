use anyhow::Result;
use polars::prelude::*;

use crate::verify::{VerifyError, score::key_columns, table::require_column};

const ROW_COL: &str = "__row";
const COUNT_COL: &str = "__count";
const NUM_SUFFIX: &str = "_num";
const DEN_SUFFIX: &str = "_den";

/// Element-wise ratio of two score tables, `numerator / denominator`, per model column.
///
/// Rows are inner-joined on the key columns (`AgVar` when present, `GEOID`) and
/// keep the numerator's order. Every value column of the numerator must exist in
/// the denominator; extra denominator columns are ignored.
pub fn compose_ratio(numerator: &DataFrame, denominator: &DataFrame) -> Result<DataFrame> {
    let (left, right) = (key_columns(numerator)?, key_columns(denominator)?);
    if left != right {
        return Err(VerifyError::KeyMismatch { left, right }.into());
    }
    let keys = left;
    require_unique_keys(numerator, &keys)?;
    require_unique_keys(denominator, &keys)?;

    let models = numerator.get_column_names().into_iter()
        .map(|name| name.to_string())
        .filter(|name| !keys.contains(name))
        .collect::<Vec<_>>();
    for model in &models {
        require_column(denominator, model)?;
    }

    let key_exprs = keys.iter()
        .map(|key| col(key.as_str()).cast(DataType::String))
        .collect::<Vec<_>>();
    let side = |df: &DataFrame, suffix: &str| {
        df.clone().lazy().select(key_exprs.iter().cloned()
            .chain(models.iter().map(|m| col(m.as_str()).cast(DataType::Float64).alias(format!("{m}{suffix}"))))
            .collect::<Vec<_>>())
    };
    let key_cols = keys.iter().map(|key| col(key.as_str())).collect::<Vec<_>>();

    let out = side(numerator, NUM_SUFFIX)
        .with_row_index(ROW_COL, None)
        .join(side(denominator, DEN_SUFFIX), key_cols.clone(), key_cols.clone(), JoinArgs::new(JoinType::Inner))
        .sort([ROW_COL], SortMultipleOptions::default())
        .select(key_cols.into_iter()
            .chain(models.iter().map(|m| {
                (col(format!("{m}{NUM_SUFFIX}")) / col(format!("{m}{DEN_SUFFIX}"))).alias(m.as_str())
            }))
            .collect::<Vec<_>>())
        .collect()?;

    tracing::info!("[verify::ratio] {} of {} rows matched", out.height(), numerator.height());
    Ok(out)
}

/// A repeated key cannot be joined unambiguously.
fn require_unique_keys(df: &DataFrame, keys: &[String]) -> Result<()> {
    let repeated = df.clone().lazy()
        .group_by(keys.iter().map(|key| col(key.as_str())).collect::<Vec<_>>())
        .agg([len().alias(COUNT_COL)])
        .filter(col(COUNT_COL).gt(lit(1)))
        .collect()?;

    if repeated.height() > 0 {
        let key = keys.iter()
            .map(|key| Ok(repeated.column(key)?.get(0)?.to_string()))
            .collect::<Result<Vec<_>>>()?
            .join(", ");
        return Err(VerifyError::DuplicateKey(key).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn scores(ids: &[&str], a: &[f64], b: &[f64]) -> DataFrame {
        DataFrame::new(vec![
            Column::new("GEOID".into(), ids),
            Column::new("A".into(), a),
            Column::new("B".into(), b),
        ]).unwrap()
    }

    #[test]
    fn identical_tables_give_one() {
        let df = scores(&["01001", "17031"], &[0.5, 2.0], &[3.0, 7.0]);
        let out = compose_ratio(&df, &df).unwrap();
        for name in ["A", "B"] {
            for value in out.column(name).unwrap().f64().unwrap().into_no_null_iter() {
                assert_relative_eq!(value, 1.0);
            }
        }
    }

    #[test]
    fn inner_join_keeps_numerator_order() {
        let numerator = scores(&["17031", "06037", "01001"], &[4.0, 1.0, 3.0], &[1.0, 1.0, 1.0]);
        let denominator = scores(&["01001", "17031"], &[1.5, 2.0], &[2.0, 4.0]);

        let out = compose_ratio(&numerator, &denominator).unwrap();
        let ids = out.column("GEOID").unwrap().str().unwrap().into_no_null_iter().collect::<Vec<_>>();
        assert_eq!(ids, vec!["17031", "01001"]);

        let a = out.column("A").unwrap().f64().unwrap();
        assert_relative_eq!(a.get(0).unwrap(), 2.0);
        assert_relative_eq!(a.get(1).unwrap(), 2.0);
        let b = out.column("B").unwrap().f64().unwrap();
        assert_relative_eq!(b.get(0).unwrap(), 0.25);
    }

    #[test]
    fn missing_denominator_model_is_reported() {
        let numerator = scores(&["01001"], &[1.0], &[1.0]);
        let denominator = DataFrame::new(vec![
            Column::new("GEOID".into(), ["01001"]),
            Column::new("A".into(), [1.0]),
        ]).unwrap();

        let err = compose_ratio(&numerator, &denominator).unwrap_err();
        assert!(matches!(err.downcast_ref::<VerifyError>(), Some(VerifyError::MissingColumn(name)) if name == "B"));
    }

    #[test]
    fn key_sets_must_match() {
        let plain = scores(&["01001"], &[1.0], &[1.0]);
        let grouped = DataFrame::new(vec![
            Column::new("AgVar".into(), ["gdd"]),
            Column::new("GEOID".into(), ["01001"]),
            Column::new("A".into(), [1.0]),
            Column::new("B".into(), [1.0]),
        ]).unwrap();

        let err = compose_ratio(&grouped, &plain).unwrap_err();
        assert!(matches!(err.downcast_ref::<VerifyError>(), Some(VerifyError::KeyMismatch { .. })));
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        let df = scores(&["01001", "01001"], &[1.0, 2.0], &[1.0, 2.0]);
        let err = compose_ratio(&df, &df).unwrap_err();
        assert!(matches!(err.downcast_ref::<VerifyError>(), Some(VerifyError::DuplicateKey(_))));
    }

    #[test]
    fn null_keys_are_rejected() {
        let numerator = DataFrame::new(vec![
            Column::new("AgVar".into(), [Some("gdd"), None]),
            Column::new("GEOID".into(), ["01001", "01001"]),
            Column::new("A".into(), [1.0, 2.0]),
        ]).unwrap();

        let err = compose_ratio(&numerator, &numerator).unwrap_err();
        assert!(matches!(err.downcast_ref::<VerifyError>(), Some(VerifyError::NullKey { column, .. }) if column == "AgVar"));
    }
}
