//! DataFrame plumbing shared by the reconciliation steps.

use polars::prelude::{
    AnyValue, BooleanChunked, Column, DataFrame, DataType, IdxCa, IdxSize, IntoColumn, NamedFrom,
    NewChunkedArray, Series,
};

use berd_common::{RowKey, any_to_bool, any_to_f64, column_f64_values, row_keys};
use berd_model::ACCEPT_CHANGES;
use tracing::debug;

use crate::error::{FreezingError, Result};

/// Keys of a snapshot. Every key column must exist and be fully populated.
pub(crate) fn snapshot_keys(
    df: &DataFrame,
    table: &'static str,
    key_columns: &[String],
) -> Result<Vec<RowKey>> {
    for name in key_columns {
        let column = df
            .column(name)
            .map_err(|_| FreezingError::MissingKeyColumn {
                table,
                column: name.clone(),
            })?;
        let count = column.null_count();
        if count > 0 {
            return Err(FreezingError::NullKey {
                table,
                column: name.clone(),
                count,
            });
        }
    }
    Ok(row_keys(df, key_columns)?)
}

/// Keys of a hand-edited review file; rows with a blank key give `None`.
pub(crate) fn review_keys(
    df: &DataFrame,
    table: &'static str,
    key_columns: &[String],
) -> Result<Vec<Option<RowKey>>> {
    let columns = key_columns
        .iter()
        .map(|name| {
            df.column(name)
                .map_err(|_| FreezingError::MissingKeyColumn {
                    table,
                    column: name.clone(),
                })
        })
        .collect::<Result<Vec<&Column>>>()?;
    let keys = row_keys(df, key_columns)?;
    Ok(keys
        .into_iter()
        .enumerate()
        .map(|(idx, key)| {
            let blank = columns
                .iter()
                .any(|column| matches!(column.get(idx), Ok(AnyValue::Null) | Err(_)));
            (!blank).then_some(key)
        })
        .collect())
}

/// Per-row review decision: only an explicit true counts as accepted.
pub(crate) fn accepted_rows(df: &DataFrame, table: &'static str) -> Result<Vec<bool>> {
    let column = df
        .column(ACCEPT_CHANGES)
        .map_err(|_| FreezingError::MissingColumn {
            table,
            column: ACCEPT_CHANGES.to_string(),
        })?;
    Ok((0..df.height())
        .map(|idx| any_to_bool(column.get(idx).unwrap_or(AnyValue::Null)) == Some(true))
        .collect())
}

/// Number of rows a reviewer accepted.
pub fn count_accepted(df: &DataFrame) -> Result<usize> {
    Ok(accepted_rows(df, "review file")?
        .into_iter()
        .filter(|accepted| *accepted)
        .count())
}

pub(crate) fn take_rows(df: &DataFrame, rows: &[usize]) -> Result<DataFrame> {
    let indices: Vec<IdxSize> = rows.iter().map(|&idx| idx as IdxSize).collect();
    Ok(df.take(&IdxCa::from_vec("rows".into(), indices))?)
}

pub(crate) fn filter_rows(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("keep".into(), keep);
    Ok(df.filter(&mask)?)
}

pub(crate) fn constant_bool(name: &str, len: usize, value: bool) -> Column {
    Series::new(name.into(), vec![value; len]).into_column()
}

/// True when every present value is a whole number.
pub(crate) fn is_integral(values: &[Option<f64>]) -> bool {
    values.iter().flatten().all(|v| v.fract() == 0.0)
}

/// Promote integer columns of `target` to Float64 where `rows` carries
/// fractional values for them, so appending cannot truncate.
pub(crate) fn widen_for(target: &DataFrame, rows: &DataFrame) -> Result<DataFrame> {
    let mut widened = target.clone();
    for column in target.get_columns() {
        let name = column.name().as_str();
        if !column.dtype().is_integer() {
            continue;
        }
        let Ok(values) = column_f64_values(rows, name) else {
            continue;
        };
        if !is_integral(&values) {
            debug!(column = name, from = %column.dtype(), "column widened to Float64");
            widened.with_column(column.cast(&DataType::Float64)?)?;
        }
    }
    Ok(widened)
}

/// Reshape `source` rows to `template`'s columns and dtypes.
///
/// `source_name` maps each template column to the source column that feeds
/// it; template columns with no source are filled with nulls. Source columns
/// not asked for are dropped. A value that does not survive the cast (text in
/// a numeric column, a fraction in an integer column) is an error naming the
/// column, never a silent null or truncation.
pub(crate) fn conform_to<F>(
    source: &DataFrame,
    template: &DataFrame,
    table: &'static str,
    source_name: F,
) -> Result<DataFrame>
where
    F: Fn(&str) -> Option<String>,
{
    let height = source.height();
    let mut columns = Vec::with_capacity(template.width());
    for target in template.get_columns() {
        let name = target.name().as_str();
        let dtype: &DataType = target.dtype();
        let column = match source_name(name).and_then(|src| source.column(&src).ok()) {
            Some(column) => {
                let cast = column.cast(dtype)?.with_name(name.into());
                let truncated = if dtype.is_integer() && column.dtype().is_float() {
                    fractional_count(column)
                } else {
                    0
                };
                let lost = cast.null_count().saturating_sub(column.null_count()) + truncated;
                if lost > 0 {
                    return Err(FreezingError::IncompatibleValues {
                        table,
                        column: name.to_string(),
                        dtype: dtype.to_string(),
                        lost,
                    });
                }
                cast
            }
            None => Series::full_null(name.into(), height, dtype).into_column(),
        };
        columns.push(column);
    }
    Ok(DataFrame::new(columns)?)
}

fn fractional_count(column: &Column) -> usize {
    (0..column.len())
        .filter_map(|idx| any_to_f64(column.get(idx).unwrap_or(AnyValue::Null)))
        .filter(|v| v.fract() != 0.0)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed(references: Vec<Option<&str>>) -> DataFrame {
        let n = references.len();
        DataFrame::new(vec![
            Series::new("reference".into(), references).into_column(),
            Series::new("period".into(), vec![202012i64; n]).into_column(),
        ])
        .unwrap()
    }

    fn key_columns() -> Vec<String> {
        vec!["reference".to_string(), "period".to_string()]
    }

    #[test]
    fn snapshot_keys_reject_nulls() {
        let df = keyed(vec![Some("A"), None]);
        let err = snapshot_keys(&df, "baseline", &key_columns()).unwrap_err();
        assert!(matches!(
            err,
            FreezingError::NullKey {
                table: "baseline",
                count: 1,
                ..
            }
        ));
    }

    #[test]
    fn snapshot_keys_reject_missing_columns() {
        let df = keyed(vec![Some("A")]);
        let columns = vec!["reference".to_string(), "instance".to_string()];
        let err = snapshot_keys(&df, "updated", &columns).unwrap_err();
        assert!(matches!(err, FreezingError::MissingKeyColumn { column, .. } if column == "instance"));
    }

    #[test]
    fn review_keys_skip_blank_rows() {
        let df = keyed(vec![Some("A"), None]);
        let keys = review_keys(&df, "amendments", &key_columns()).unwrap();
        assert!(keys[0].is_some());
        assert!(keys[1].is_none());
    }

    #[test]
    fn accepted_rows_read_loose_booleans() {
        let df = DataFrame::new(vec![
            Series::new(ACCEPT_CHANGES.into(), vec![Some("True"), Some("no"), None, Some("1")])
                .into_column(),
        ])
        .unwrap();
        assert_eq!(
            accepted_rows(&df, "additions").unwrap(),
            vec![true, false, false, true]
        );
        assert_eq!(count_accepted(&df).unwrap(), 2);
    }

    #[test]
    fn conform_fills_missing_and_casts() {
        let template = DataFrame::new(vec![
            Series::new("reference".into(), Vec::<String>::new()).into_column(),
            Series::new("701".into(), Vec::<f64>::new()).into_column(),
            Series::new("postcode".into(), Vec::<String>::new()).into_column(),
        ])
        .unwrap();
        let source = DataFrame::new(vec![
            Series::new("reference".into(), vec!["Z"]).into_column(),
            Series::new("701".into(), vec![4i64]).into_column(),
            Series::new("extra".into(), vec![true]).into_column(),
        ])
        .unwrap();

        let out = conform_to(&source, &template, "additions", |name| Some(name.to_string())).unwrap();

        assert_eq!(
            out.get_column_names_owned(),
            template.get_column_names_owned()
        );
        assert_eq!(out.column("701").unwrap().f64().unwrap().get(0), Some(4.0));
        assert_eq!(out.column("postcode").unwrap().null_count(), 1);
    }
}
