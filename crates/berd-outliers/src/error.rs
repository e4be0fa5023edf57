use berd_model::ConfigError;
use thiserror::Error;

/// Errors raised by the outlier clipper. All of them abort the run.
#[derive(Debug, Error)]
pub enum OutlierError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("column '{column}' not found in input table")]
    MissingColumn { column: String },

    /// No sampled, cleared, positive responses for a requested column.
    #[error(
        "no valid responses to rank for column '{column}'; remove it from outliers.flag_value_cols"
    )]
    EmptyPopulation { column: String },

    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

impl From<polars::prelude::PolarsError> for OutlierError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::DataFrame {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OutlierError>;
