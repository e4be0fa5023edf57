//! Outlier flag assembly over a survey table.

use std::collections::{BTreeMap, HashMap, HashSet};

use polars::prelude::{AnyValue, Column, DataFrame, DataType, IntoColumn, NamedFrom, Series};
use tracing::{debug, error, info, info_span, warn};

use berd_common::{any_to_bool, any_to_string, column_f64_values};
use berd_model::{
    AUTO_OUTLIER, ColumnNames, MANUAL_OUTLIER, ManualOutlierPolicy, OUTLIER, OutlierConfig,
    outlier_flag_column,
};

use crate::banding::band_sizes;
use crate::error::{OutlierError, Result};

/// Flagged output plus per-column statistics for reporting.
#[derive(Debug, Clone)]
pub struct FlaggedTable {
    pub data: DataFrame,
    pub summaries: Vec<ColumnSummary>,
}

/// What the clipper did for one value column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSummary {
    pub column: String,
    /// Rows that passed the sampled / cleared / positive filter.
    pub valid_rows: usize,
    pub groups: usize,
    /// Rows of the full table carrying a true flag.
    pub flagged_rows: usize,
}

fn require_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column> {
    df.column(name).map_err(|_| OutlierError::MissingColumn {
        column: name.to_string(),
    })
}

fn cell_text(column: &Column, idx: usize) -> String {
    any_to_string(column.get(idx).unwrap_or(AnyValue::Null))
}

/// Row indices eligible for ranking on `value_column`.
///
/// A row is valid when its selection type is the sampled marker, its status
/// is one of the clear codes and its value is strictly positive. An empty
/// result is an error: the column cannot be clipped and must be dropped from
/// the configuration.
pub fn valid_population(
    df: &DataFrame,
    value_column: &str,
    config: &OutlierConfig,
    columns: &ColumnNames,
) -> Result<Vec<usize>> {
    let selection = require_column(df, &columns.selection_type)?;
    let status = require_column(df, &columns.status)?;
    require_column(df, value_column)?;
    let values = column_f64_values(df, value_column)?;
    let clear: HashSet<&str> = config.clear_statuses.iter().map(String::as_str).collect();

    let valid: Vec<usize> = (0..df.height())
        .filter(|&idx| {
            values[idx].is_some_and(|v| v > 0.0)
                && cell_text(selection, idx) == config.sampled_marker
                && clear.contains(cell_text(status, idx).as_str())
        })
        .collect();

    if valid.is_empty() {
        error!(column = value_column, "no valid responses to rank");
        return Err(OutlierError::EmptyPopulation {
            column: value_column.to_string(),
        });
    }
    Ok(valid)
}

/// Flag one value column, returning a flag for every row of `df`.
///
/// Valid rows are ranked within their `(period, cell)` group by ascending
/// value; equal values keep their row order. Flags are then attached to all
/// rows sharing the flagged row's `(period, cell, reference)`, and every
/// other row is `false`.
pub fn flag_column(
    df: &DataFrame,
    value_column: &str,
    config: &OutlierConfig,
    columns: &ColumnNames,
) -> Result<(Vec<bool>, ColumnSummary)> {
    let valid = valid_population(df, value_column, config, columns)?;
    let period = require_column(df, &columns.period)?;
    let cell = require_column(df, &columns.cell)?;
    let reference = require_column(df, &columns.reference)?;
    let values = column_f64_values(df, value_column)?;

    let mut groups: BTreeMap<(String, String), Vec<(usize, f64)>> = BTreeMap::new();
    for idx in valid.iter().copied() {
        let Some(value) = values[idx] else {
            continue;
        };
        groups
            .entry((cell_text(period, idx), cell_text(cell, idx)))
            .or_default()
            .push((idx, value));
    }

    let mut flagged_keys: HashMap<(String, String, String), bool> = HashMap::new();
    for ((group_period, group_cell), members) in groups.iter_mut() {
        // stable sort: ties keep encounter order
        members.sort_by(|a, b| a.1.total_cmp(&b.1));
        let bands = band_sizes(members.len(), config.upper_clip, config.lower_clip);
        debug!(
            column = value_column,
            period = %group_period,
            cell = %group_cell,
            group_count = bands.group_count,
            upper_band_size = bands.upper_band_size,
            lower_band_size = bands.lower_band_size,
            "ranked group"
        );
        for (position, (idx, _)) in members.iter().enumerate() {
            let key = (
                group_period.clone(),
                group_cell.clone(),
                cell_text(reference, *idx),
            );
            let entry = flagged_keys.entry(key).or_insert(false);
            *entry |= bands.is_outlier(position + 1);
        }
    }

    let flags: Vec<bool> = (0..df.height())
        .map(|idx| {
            let key = (
                cell_text(period, idx),
                cell_text(cell, idx),
                cell_text(reference, idx),
            );
            flagged_keys.get(&key).copied().unwrap_or(false)
        })
        .collect();

    let summary = ColumnSummary {
        column: value_column.to_string(),
        valid_rows: valid.len(),
        groups: groups.len(),
        flagged_rows: flags.iter().filter(|flag| **flag).count(),
    };
    Ok((flags, summary))
}

/// Flag every configured value column and build the master flag.
///
/// Adds `<col>_outlier_flag` per column, `auto_outlier` (true when any
/// column flag is true) and an empty `manual_outlier` slot. An existing
/// `manual_outlier` column is kept as-is so reviewers' overrides survive a
/// re-run; existing flag columns are recomputed.
pub fn flag_outliers(
    df: &DataFrame,
    config: &OutlierConfig,
    columns: &ColumnNames,
) -> Result<FlaggedTable> {
    let span = info_span!("flag_outliers", rows = df.height());
    let _guard = span.enter();

    config.validate()?;
    info!(
        upper_clip = config.upper_clip,
        lower_clip = config.lower_clip,
        flag_value_cols = ?config.flag_value_cols,
        "clip parameters"
    );
    if config.flag_value_cols.is_empty() {
        warn!("no value columns configured; auto_outlier will be false for every row");
    }

    let mut data = df.clone();
    let mut flag_sums = vec![0usize; df.height()];
    let mut summaries = Vec::with_capacity(config.flag_value_cols.len());

    for value_column in &config.flag_value_cols {
        let (flags, summary) = flag_column(df, value_column, config, columns)?;
        for (sum, flag) in flag_sums.iter_mut().zip(&flags) {
            *sum += usize::from(*flag);
        }
        info!(
            column = %value_column,
            valid_rows = summary.valid_rows,
            groups = summary.groups,
            flagged_rows = summary.flagged_rows,
            "flagged column"
        );
        let name = outlier_flag_column(value_column);
        data.with_column(Series::new(name.as_str().into(), flags))?;
        summaries.push(summary);
    }

    let auto: Vec<bool> = flag_sums.iter().map(|sum| *sum > 0).collect();
    data.with_column(Series::new(AUTO_OUTLIER.into(), auto))?;
    if data.column(MANUAL_OUTLIER).is_err() {
        data.with_column(
            Series::full_null(MANUAL_OUTLIER.into(), df.height(), &DataType::Boolean)
                .into_column(),
        )?;
    }

    Ok(FlaggedTable { data, summaries })
}

/// Derive the final `outlier` column from `auto_outlier` and `manual_outlier`.
///
/// Manual values are read leniently (`True`, `Y`, `1`, ...) since the column
/// is filled in by hand; blanks and unrecognised text count as unset.
pub fn combine_outlier_flags(df: &DataFrame, policy: ManualOutlierPolicy) -> Result<DataFrame> {
    let auto = require_column(df, AUTO_OUTLIER)?;
    let manual = df.column(MANUAL_OUTLIER).ok();

    let mut overridden = 0usize;
    let combined: Vec<bool> = (0..df.height())
        .map(|idx| {
            let auto_flag = any_to_bool(auto.get(idx).unwrap_or(AnyValue::Null)).unwrap_or(false);
            let manual_flag =
                manual.and_then(|column| any_to_bool(column.get(idx).unwrap_or(AnyValue::Null)));
            let resolved = policy.resolve(auto_flag, manual_flag);
            if resolved != auto_flag {
                overridden += 1;
            }
            resolved
        })
        .collect();

    info!(?policy, overridden, "combined outlier flags");
    let mut data = df.clone();
    data.with_column(Series::new(OUTLIER.into(), combined))?;
    Ok(data)
}
