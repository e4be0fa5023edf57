//! Shared data model for the BERD processing crates.
//!
//! - **columns**: canonical input column names and derived column naming
//! - **config**: TOML pipeline configuration for the clipper and the reconciler
//! - **options**: behavioural switches that resolve open policy choices
//! - **error**: configuration errors

pub mod columns;
pub mod config;
pub mod error;
pub mod options;

pub use columns::{
    ACCEPT_CHANGES, ANY_DIFF_NONZERO, AUTO_OUTLIER, ColumnNames, MANUAL_OUTLIER, OUTLIER,
    diff_column, diff_nonzero_column, outlier_flag_column, updated_column,
};
pub use config::{
    FreezingConfig, OutlierConfig, PipelineConfig, TemplateVars, validate_clip_params,
};
pub use error::{ConfigError, Result};
pub use options::{DiffDirection, ManualOutlierPolicy};
