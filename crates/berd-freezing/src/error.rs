use berd_ingest::IngestError;
use berd_model::ConfigError;
use thiserror::Error;

/// Errors raised during reconciliation.
///
/// Expected-empty outcomes (no amendments, no additions, no review file) are
/// not errors; they are logged and passed through.
#[derive(Debug, Error)]
pub enum FreezingError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error("key column '{column}' missing from {table}")]
    MissingKeyColumn { table: &'static str, column: String },

    #[error("key column '{column}' in {table} has {count} null value(s)")]
    NullKey {
        table: &'static str,
        column: String,
        count: usize,
    },

    #[error("column '{column}' missing from {table}")]
    MissingColumn { table: &'static str, column: String },

    /// Values that would be lost converting rows to the target column type.
    #[error("{lost} value(s) in column '{column}' of {table} cannot be stored as {dtype}")]
    IncompatibleValues {
        table: &'static str,
        column: String,
        dtype: String,
        lost: usize,
    },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for FreezingError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FreezingError>;
