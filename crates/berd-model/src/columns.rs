//! Column naming for survey records and derived outputs.

use serde::{Deserialize, Serialize};

/// Master automatic outlier flag.
pub const AUTO_OUTLIER: &str = "auto_outlier";
/// Human override slot, created empty.
pub const MANUAL_OUTLIER: &str = "manual_outlier";
/// Final flag after applying the manual override policy.
pub const OUTLIER: &str = "outlier";
/// Review decision column on amendment and addition files.
pub const ACCEPT_CHANGES: &str = "accept_changes";
/// True when any tracked column of an amendment changed.
pub const ANY_DIFF_NONZERO: &str = "is_any_diff_nonzero";

/// `701` -> `701_outlier_flag`
pub fn outlier_flag_column(column: &str) -> String {
    format!("{column}_outlier_flag")
}

/// `701` -> `701_updated`
pub fn updated_column(column: &str) -> String {
    format!("{column}_updated")
}

/// `701` -> `701_diff`
pub fn diff_column(column: &str) -> String {
    format!("{column}_diff")
}

/// `701` -> `is_701_diff_nonzero`
pub fn diff_nonzero_column(column: &str) -> String {
    format!("is_{column}_diff_nonzero")
}

/// Names of the record columns the pipeline reads.
///
/// Snapshots from different survey years do not agree on naming, so every
/// name can be overridden from the `[columns]` config section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnNames {
    pub reference: String,
    pub period: String,
    pub instance: String,
    pub cell: String,
    pub selection_type: String,
    pub status: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            reference: "reference".to_string(),
            period: "period".to_string(),
            instance: "instance".to_string(),
            cell: "cellnumber".to_string(),
            selection_type: "selectiontype".to_string(),
            status: "statusencoded".to_string(),
        }
    }
}
