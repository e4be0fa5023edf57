//! Amendments: records present in both snapshots whose tracked values moved.

use std::collections::{HashMap, HashSet};

use polars::prelude::{AnyValue, Column, DataFrame, DataType, IntoColumn, NamedFrom, Series};
use tracing::{debug, info, info_span, warn};

use berd_common::{RowKey, any_to_f64, column_f64_values};
use berd_model::{
    ACCEPT_CHANGES, ANY_DIFF_NONZERO, FreezingConfig, diff_column, diff_nonzero_column,
    updated_column,
};

use crate::error::{FreezingError, Result};
use crate::frame::{
    accepted_rows, constant_bool, is_integral, review_keys, snapshot_keys, take_rows,
};

fn tracked_values(
    df: &DataFrame,
    table: &'static str,
    tracked: &[String],
) -> Result<Vec<Vec<Option<f64>>>> {
    tracked
        .iter()
        .map(|name| {
            column_f64_values(df, name).map_err(|_| FreezingError::MissingColumn {
                table,
                column: name.clone(),
            })
        })
        .collect()
}

/// Columns copied from the updated snapshot onto amendment rows.
///
/// An explicit `carry_columns` list wins; otherwise every updated column
/// that is neither a key nor tracked is carried.
fn carried_columns(updated: &DataFrame, config: &FreezingConfig) -> Vec<String> {
    if config.carry_columns.is_empty() {
        return updated
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .filter(|name| {
                !config.key_columns.contains(name)
                    && !config.tracked_columns.contains(name)
                    && name != ACCEPT_CHANGES
            })
            .collect();
    }
    config
        .carry_columns
        .iter()
        .filter(|name| {
            let present = updated.column(name).is_ok();
            if !present {
                warn!(column = %name, "carry column missing from updated snapshot; skipped");
            }
            present
        })
        .cloned()
        .collect()
}

/// Compute amendments between the frozen `baseline` and the `updated` snapshot.
///
/// Records are matched on the key columns (an inner join). For every tracked
/// column `diff = updated - original`, and `is_<col>_diff_nonzero` follows
/// the configured [`DiffDirection`]: by default only increases above `1e-5`
/// count. A record is an amendment when any tracked column changed.
///
/// The result holds the keys, `<col>_updated`, `<col>_diff`,
/// `is_<col>_diff_nonzero` per tracked column, `is_any_diff_nonzero`, the
/// carried columns and `accept_changes = false`. Returns `None` when the
/// snapshots share no records or nothing changed.
///
/// [`DiffDirection`]: berd_model::DiffDirection
pub fn get_amendments(
    baseline: &DataFrame,
    updated: &DataFrame,
    config: &FreezingConfig,
) -> Result<Option<DataFrame>> {
    let span = info_span!(
        "get_amendments",
        baseline_rows = baseline.height(),
        updated_rows = updated.height()
    );
    let _guard = span.enter();
    config.validate()?;

    let baseline_keys = snapshot_keys(baseline, "baseline", &config.key_columns)?;
    let updated_keys = snapshot_keys(updated, "updated snapshot", &config.key_columns)?;
    let original = tracked_values(baseline, "baseline", &config.tracked_columns)?;
    let revised = tracked_values(updated, "updated snapshot", &config.tracked_columns)?;

    let mut index: HashMap<&RowKey, usize> = HashMap::with_capacity(baseline_keys.len());
    let mut duplicates = 0usize;
    for (idx, key) in baseline_keys.iter().enumerate() {
        if index.contains_key(key) {
            duplicates += 1;
        } else {
            index.insert(key, idx);
        }
    }
    if duplicates > 0 {
        warn!(duplicates, "baseline has duplicate keys; first occurrence is compared");
    }

    let matched: Vec<(usize, usize)> = updated_keys
        .iter()
        .enumerate()
        .filter_map(|(upd_idx, key)| index.get(key).map(|&base_idx| (upd_idx, base_idx)))
        .collect();
    if matched.is_empty() {
        info!("no records common to both snapshots; no amendments");
        return Ok(None);
    }

    // diffs[col][match]
    let diffs: Vec<Vec<Option<f64>>> = original
        .iter()
        .zip(&revised)
        .map(|(before, after)| {
            matched
                .iter()
                .map(|&(upd_idx, base_idx)| match (after[upd_idx], before[base_idx]) {
                    (Some(new), Some(old)) => Some(new - old),
                    _ => None,
                })
                .collect()
        })
        .collect();
    let nonzero: Vec<Vec<bool>> = diffs
        .iter()
        .map(|column| {
            column
                .iter()
                .map(|diff| diff.is_some_and(|d| config.diff_direction.is_change(d)))
                .collect()
        })
        .collect();

    let kept: Vec<usize> = (0..matched.len())
        .filter(|&m| nonzero.iter().any(|column| column[m]))
        .collect();
    if kept.is_empty() {
        info!(matched = matched.len(), "no tracked values changed; no amendments");
        return Ok(None);
    }

    let updated_rows: Vec<usize> = kept.iter().map(|&m| matched[m].0).collect();
    let taken = take_rows(updated, &updated_rows)?;
    let carried = carried_columns(updated, config);

    let mut columns: Vec<Column> = Vec::new();
    for name in &config.key_columns {
        columns.push(taken.column(name)?.clone());
    }
    for (col_idx, name) in config.tracked_columns.iter().enumerate() {
        let new_values: Vec<Option<f64>> = updated_rows
            .iter()
            .map(|&idx| revised[col_idx][idx])
            .collect();
        let diff_values: Vec<Option<f64>> = kept.iter().map(|&m| diffs[col_idx][m]).collect();
        let flags: Vec<bool> = kept.iter().map(|&m| nonzero[col_idx][m]).collect();
        columns.push(Series::new(updated_column(name).as_str().into(), new_values).into_column());
        columns.push(Series::new(diff_column(name).as_str().into(), diff_values).into_column());
        columns.push(Series::new(diff_nonzero_column(name).as_str().into(), flags).into_column());
    }
    columns.push(constant_bool(ANY_DIFF_NONZERO, kept.len(), true));
    for name in &carried {
        columns.push(taken.column(name)?.clone());
    }
    columns.push(constant_bool(ACCEPT_CHANGES, kept.len(), false));

    info!(
        matched = matched.len(),
        amendments = kept.len(),
        "amendments found"
    );
    Ok(Some(DataFrame::new(columns)?))
}

/// Apply reviewer-accepted amendments onto the baseline.
///
/// Only rows with `accept_changes` true are used; when none are accepted
/// the baseline is returned unchanged. For each accepted key the tracked
/// columns of the baseline row are overwritten with the `<col>_updated`
/// values, whole record at a time. If a key appears more than once among the
/// accepted rows, the last one wins. Row order and all other columns of the
/// baseline are preserved.
pub fn apply_amendments(
    baseline: &DataFrame,
    amendments: &DataFrame,
    config: &FreezingConfig,
) -> Result<DataFrame> {
    let span = info_span!("apply_amendments", amendments = amendments.height());
    let _guard = span.enter();
    config.validate()?;

    let accepted = accepted_rows(amendments, "amendments")?;
    let keys = review_keys(amendments, "amendments", &config.key_columns)?;
    let rejected = accepted.iter().filter(|a| !**a).count();

    let mut chosen: HashMap<RowKey, usize> = HashMap::new();
    let mut blank_keys = 0usize;
    for (idx, (key, accept)) in keys.into_iter().zip(&accepted).enumerate() {
        match (key, accept) {
            (Some(key), true) => {
                chosen.insert(key, idx);
            }
            (None, true) => blank_keys += 1,
            _ => {}
        }
    }
    if blank_keys > 0 {
        warn!(blank_keys, "accepted amendments with blank keys ignored");
    }
    if chosen.is_empty() {
        info!(rejected, "no accepted amendments; baseline unchanged");
        return Ok(baseline.clone());
    }

    let baseline_keys = snapshot_keys(baseline, "baseline", &config.key_columns)?;
    let targets: Vec<Option<usize>> = baseline_keys
        .iter()
        .map(|key| chosen.get(key).copied())
        .collect();
    let present: HashSet<&RowKey> = baseline_keys.iter().collect();
    let orphaned = chosen.keys().filter(|key| !present.contains(key)).count();
    if orphaned > 0 {
        warn!(orphaned, "accepted amendments match no baseline record; skipped");
    }

    let mut data = baseline.clone();
    for name in &config.tracked_columns {
        let replacement_name = updated_column(name);
        let replacements = column_f64_values(amendments, &replacement_name).map_err(|_| {
            FreezingError::MissingColumn {
                table: "amendments",
                column: replacement_name.clone(),
            }
        })?;
        let current = baseline
            .column(name)
            .map_err(|_| FreezingError::MissingColumn {
                table: "baseline",
                column: name.clone(),
            })?;
        let merged: Vec<Option<f64>> = targets
            .iter()
            .enumerate()
            .map(|(row, target)| match target {
                Some(amend_idx) => replacements[*amend_idx],
                None => any_to_f64(current.get(row).unwrap_or(AnyValue::Null)),
            })
            .collect();

        let dtype = current.dtype().clone();
        let mut series = Series::new(name.as_str().into(), merged.clone());
        if dtype.is_integer() && is_integral(&merged) {
            series = series.cast(&dtype)?;
        } else if dtype != DataType::Float64 {
            debug!(column = %name, from = %dtype, "tracked column widened to Float64");
        }
        data.with_column(series)?;
    }

    let applied = targets.iter().filter(|target| target.is_some()).count();
    info!(
        accepted = chosen.len(),
        rejected,
        applied_rows = applied,
        "amendments applied"
    );
    Ok(data)
}
