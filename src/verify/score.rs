//! Unit × model score tables.

use anyhow::{Result, ensure};
use polars::prelude::*;

use crate::verify::{AGVAR_COL, GEOID_COL, VerifyError, table::{GroupKey, require_column}};

/// Column-major score matrix: one row per group key, one column per model or statistic.
#[derive(Debug, Clone)]
pub(crate) struct ScoreTable {
    by_agvar: bool,
    keys: Vec<GroupKey>,
    names: Vec<String>,
    columns: Vec<Vec<f64>>,
}

impl ScoreTable {
    pub(crate) fn new(by_agvar: bool, names: Vec<String>) -> Self {
        let columns = vec![Vec::new(); names.len()];
        Self { by_agvar, keys: Vec::new(), names, columns }
    }

    /// Append a row; `values` must follow the column order.
    pub(crate) fn push(&mut self, key: GroupKey, values: Vec<f64>) {
        debug_assert_eq!(values.len(), self.names.len(), "row width mismatch");
        self.keys.push(key);
        for (column, value) in self.columns.iter_mut().zip(values) {
            column.push(value);
        }
    }

    /// Build the DataFrame form with `f64` value columns.
    pub(crate) fn into_dataframe(self) -> Result<DataFrame> {
        self.into_dataframe_as(&DataType::Float64)
    }

    /// Build the DataFrame form, casting value columns to `dtype`.
    pub(crate) fn into_dataframe_as(self, dtype: &DataType) -> Result<DataFrame> {
        ensure!(self.columns.iter().all(|column| column.len() == self.keys.len()),
            "[verify::score] ragged score table");

        let mut columns = Vec::with_capacity(self.names.len() + 2);
        if self.by_agvar {
            columns.push(Column::new(
                AGVAR_COL.into(),
                self.keys.iter().map(|key| key.agvar.clone().unwrap_or_default()).collect::<Vec<_>>(),
            ));
        }
        columns.push(Column::new(
            GEOID_COL.into(),
            self.keys.iter().map(|key| key.geo_id.id().to_string()).collect::<Vec<_>>(),
        ));
        for (name, values) in self.names.into_iter().zip(self.columns) {
            columns.push(Column::new(name.into(), values).cast(dtype)?);
        }

        Ok(DataFrame::new(columns)?)
    }
}

/// Key column names of a score table; every key value must be present.
pub(crate) fn key_columns(df: &DataFrame) -> Result<Vec<String>, VerifyError> {
    require_column(df, GEOID_COL)?;
    let keys = if df.column(AGVAR_COL).is_ok() {
        vec![AGVAR_COL.to_string(), GEOID_COL.to_string()]
    } else {
        vec![GEOID_COL.to_string()]
    };

    for name in &keys {
        let column = require_column(df, name)?;
        if let Some(row) = column.is_null().into_iter().position(|null| null == Some(true)) {
            return Err(VerifyError::NullKey { column: name.clone(), row });
        }
    }
    Ok(keys)
}
