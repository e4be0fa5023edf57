//! Rank-based outlier clipping.
//!
//! Within each `(period, cell)` group the valid responses for a value column
//! are ranked ascending, ties broken by row order, and the top `upper_clip`
//! and bottom `lower_clip` fractions are flagged. Band sizes use round half
//! up, not banker's rounding, so a band of 2.5 rows flags 3.
//!
//! - **banding**: band sizes and rounding
//! - **clipper**: population filtering, ranking and flag assembly
//! - **error**: clipper errors

pub mod banding;
pub mod clipper;
pub mod error;

pub use banding::{BandSizes, band_sizes, round_half_up};
pub use clipper::{
    ColumnSummary, FlaggedTable, combine_outlier_flags, flag_column, flag_outliers,
    valid_population,
};
pub use error::{OutlierError, Result};
