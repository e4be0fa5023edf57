use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating pipeline configuration.
///
/// All of these are fatal: a run never proceeds with a corrected value.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A clip fraction outside `[0, 1)`.
    #[error("{name} must be in [0, 1), got {value}")]
    InvalidClip { name: &'static str, value: f64 },

    #[error("upper_clip + lower_clip must be below 1, got {upper} + {lower}")]
    ClipSumTooLarge { upper: f64, lower: f64 },

    #[error("freezing.key_columns must not be empty")]
    EmptyKeyColumns,

    #[error("freezing.tracked_columns must not be empty")]
    EmptyTrackedColumns,

    #[error("column '{column}' is listed as both a key and a tracked column")]
    KeyColumnTracked { column: String },

    /// A carry column that would clash with a column the amendments table
    /// already holds.
    #[error("freezing.carry_columns entry '{column}' {reason}")]
    InvalidCarryColumn { column: String, reason: &'static str },

    #[error("invalid output template '{template}': {reason}")]
    InvalidTemplate { template: String, reason: String },
}

impl ConfigError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
