use thiserror::Error;

/// Contract violations detected while preparing or scoring an observation table.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("unknown metric {name:?}; expected one of: {valid}")]
    UnknownMetric { name: String, valid: String },

    #[error("missing required column {0:?}")]
    MissingColumn(String),

    #[error("truth column {0:?} cannot be verified as a model")]
    TruthInModels(String),

    #[error("no model columns to verify")]
    NoModels,

    #[error("ensemble-mean column {0:?} not found among model columns")]
    MissingEnsembleMean(String),

    #[error("ensemble has no members besides {0:?}")]
    NoEnsembleMembers(String),

    #[error("empty year range: {min} > {max}")]
    EmptyYearRange { min: i32, max: i32 },

    #[error("key columns differ between tables: {left:?} vs {right:?}")]
    KeyMismatch { left: Vec<String>, right: Vec<String> },

    #[error("null {column} key at row {row}")]
    NullKey { column: String, row: usize },

    #[error("duplicate key {0} in score table")]
    DuplicateKey(String),
}
