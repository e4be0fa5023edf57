//! Additions: records of the updated snapshot with no frozen counterpart.

use std::collections::HashSet;

use polars::prelude::DataFrame;
use tracing::{info, info_span, warn};

use berd_common::RowKey;
use berd_model::{ACCEPT_CHANGES, FreezingConfig};

use crate::error::Result;
use crate::frame::{
    accepted_rows, conform_to, constant_bool, filter_rows, review_keys, snapshot_keys, widen_for,
};

/// Rows of `updated` whose key is absent from `baseline`.
///
/// The updated-side columns are kept as they are and `accept_changes` is set
/// to `false` for review. Returns `None` when there are no new records.
pub fn get_additions(
    baseline: &DataFrame,
    updated: &DataFrame,
    config: &FreezingConfig,
) -> Result<Option<DataFrame>> {
    let span = info_span!(
        "get_additions",
        baseline_rows = baseline.height(),
        updated_rows = updated.height()
    );
    let _guard = span.enter();
    config.validate()?;

    let baseline_keys = snapshot_keys(baseline, "baseline", &config.key_columns)?;
    let updated_keys = snapshot_keys(updated, "updated snapshot", &config.key_columns)?;
    let frozen: HashSet<&RowKey> = baseline_keys.iter().collect();

    let keep: Vec<bool> = updated_keys.iter().map(|key| !frozen.contains(key)).collect();
    let count = keep.iter().filter(|new| **new).count();
    if count == 0 {
        info!("no new records in the updated snapshot; no additions");
        return Ok(None);
    }

    let mut additions = filter_rows(updated, &keep)?;
    additions.with_column(constant_bool(ACCEPT_CHANGES, count, false))?;
    info!(additions = count, "additions found");
    Ok(Some(additions))
}

/// Append reviewer-accepted additions to the baseline.
///
/// Accepted rows are aligned to the baseline's columns before the append:
/// columns the baseline lacks (including `accept_changes`) are dropped and
/// baseline columns missing from the review file become null. An integer
/// baseline column receiving a fractional value is widened to Float64; a
/// value that fits no baseline type is an
/// [`IncompatibleValues`](crate::FreezingError::IncompatibleValues) error.
/// Rows whose key is already frozen are skipped.
pub fn apply_additions(
    baseline: &DataFrame,
    additions: &DataFrame,
    config: &FreezingConfig,
) -> Result<DataFrame> {
    let span = info_span!("apply_additions", additions = additions.height());
    let _guard = span.enter();
    config.validate()?;

    let accepted = accepted_rows(additions, "additions")?;
    let keys = review_keys(additions, "additions", &config.key_columns)?;
    let baseline_keys = snapshot_keys(baseline, "baseline", &config.key_columns)?;
    let mut frozen: HashSet<RowKey> = baseline_keys.into_iter().collect();

    let mut blank_keys = 0usize;
    let mut already_frozen = 0usize;
    let keep: Vec<bool> = keys
        .into_iter()
        .zip(&accepted)
        .map(|(key, accept)| match (key, accept) {
            (_, false) => false,
            (None, true) => {
                blank_keys += 1;
                false
            }
            (Some(key), true) => {
                let fresh = frozen.insert(key);
                if !fresh {
                    already_frozen += 1;
                }
                fresh
            }
        })
        .collect();
    if blank_keys > 0 {
        warn!(blank_keys, "accepted additions with blank keys ignored");
    }
    if already_frozen > 0 {
        warn!(
            already_frozen,
            "accepted additions already present in the baseline; skipped"
        );
    }

    let appended = keep.iter().filter(|k| **k).count();
    if appended == 0 {
        info!(
            rejected = accepted.iter().filter(|a| !**a).count(),
            "no accepted additions; baseline unchanged"
        );
        return Ok(baseline.clone());
    }

    let rows = filter_rows(additions, &keep)?;
    let target = widen_for(baseline, &rows)?;
    let aligned = conform_to(&rows, &target, "additions", |name| Some(name.to_string()))?;
    let data = target.vstack(&aligned)?;
    info!(appended, rows = data.height(), "additions applied");
    Ok(data)
}
