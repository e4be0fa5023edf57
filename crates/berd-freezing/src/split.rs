//! Split cases: keys reported as both an addition and an amendment.

use std::collections::HashSet;

use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use berd_common::RowKey;
use berd_model::{ANY_DIFF_NONZERO, FreezingConfig, diff_column, diff_nonzero_column, updated_column};

use crate::error::Result;
use crate::frame::{conform_to, filter_rows, snapshot_keys};

/// Source column in an additions table for an amendments-table column.
///
/// `<col>_updated` is fed by the tracked column itself; the diff columns have
/// no counterpart and stay null.
fn addition_source(name: &str, config: &FreezingConfig) -> Option<String> {
    if name == ANY_DIFF_NONZERO {
        return None;
    }
    for tracked in &config.tracked_columns {
        if name == updated_column(tracked) {
            return Some(tracked.clone());
        }
        if name == diff_column(tracked) || name == diff_nonzero_column(tracked) {
            return None;
        }
    }
    Some(name.to_string())
}

/// Move additions whose key also appears among the amendments into the
/// amendments table, so the two review sets are disjoint on key.
///
/// Moved rows are reshaped to the amendments columns with their diff columns
/// left null; an amendment already carrying the key is kept alongside. No
/// values are recomputed. Returns the remaining additions (`None` when all
/// were moved) and the merged amendments.
pub fn bring_together_split_cases(
    additions: &DataFrame,
    amendments: &DataFrame,
    config: &FreezingConfig,
) -> Result<(Option<DataFrame>, DataFrame)> {
    let span = info_span!(
        "bring_together_split_cases",
        additions = additions.height(),
        amendments = amendments.height()
    );
    let _guard = span.enter();
    config.validate()?;

    let amendment_keys = snapshot_keys(amendments, "amendments", &config.key_columns)?;
    let addition_keys = snapshot_keys(additions, "additions", &config.key_columns)?;
    let amended: HashSet<&RowKey> = amendment_keys.iter().collect();

    let split: Vec<bool> = addition_keys.iter().map(|key| amended.contains(key)).collect();
    let moved = split.iter().filter(|s| **s).count();
    if moved == 0 {
        debug!("no split cases");
        return Ok((Some(additions.clone()), amendments.clone()));
    }

    let moving = filter_rows(additions, &split)?;
    let reshaped = conform_to(&moving, amendments, "additions", |name| {
        addition_source(name, config)
    })?;
    let merged = amendments.vstack(&reshaped)?;

    let remaining_mask: Vec<bool> = split.iter().map(|s| !s).collect();
    let remaining = filter_rows(additions, &remaining_mask)?;
    info!(
        moved,
        remaining_additions = remaining.height(),
        amendments = merged.height(),
        "split cases moved to amendments"
    );
    let remaining = (remaining.height() > 0).then_some(remaining);
    Ok((remaining, merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> FreezingConfig {
        FreezingConfig {
            tracked_columns: vec!["701".to_string()],
            ..FreezingConfig::default()
        }
    }

    #[test]
    fn updated_columns_map_to_tracked_source() {
        let config = config();
        assert_eq!(addition_source("701_updated", &config), Some("701".to_string()));
        assert_eq!(addition_source("701_diff", &config), None);
        assert_eq!(addition_source("is_701_diff_nonzero", &config), None);
        assert_eq!(addition_source(ANY_DIFF_NONZERO, &config), None);
        assert_eq!(addition_source("reference", &config), Some("reference".to_string()));
    }
}
