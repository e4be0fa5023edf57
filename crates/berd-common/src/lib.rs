//! Shared utilities for BERD crates.
//!
//! This crate provides the Polars value conversions and row-key helpers used
//! by the clipper and the reconciler.

pub mod keys;
pub mod values;

pub use keys::{RowKey, row_keys};
pub use values::{
    any_to_bool, any_to_f64, any_to_string, column_f64_values, column_value_string,
    format_numeric, parse_bool, parse_f64,
};
