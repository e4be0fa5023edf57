//! Composite row keys built from one or more columns.

use polars::prelude::{AnyValue, DataFrame, PolarsResult};

use crate::values::any_to_string;

/// The text form of each key column for one row.
pub type RowKey = Vec<String>;

/// Build the composite key of every row.
///
/// Values go through [`any_to_string`], so `period = 202012` read as an
/// integer in one snapshot and as `202012.0` in another still match.
pub fn row_keys(df: &DataFrame, columns: &[String]) -> PolarsResult<Vec<RowKey>> {
    let key_columns = columns
        .iter()
        .map(|name| df.column(name))
        .collect::<PolarsResult<Vec<_>>>()?;
    let mut keys = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let key = key_columns
            .iter()
            .map(|column| any_to_string(column.get(idx).unwrap_or(AnyValue::Null)))
            .collect();
        keys.push(key);
    }
    Ok(keys)
}
