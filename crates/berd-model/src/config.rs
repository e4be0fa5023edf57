//! Pipeline configuration loaded from TOML.
//!
//! ```toml
//! [outliers]
//! upper_clip = 0.05
//! lower_clip = 0.0
//! flag_value_cols = ["701", "702", "703"]
//!
//! [freezing]
//! tracked_columns = ["701", "702", "703"]
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::columns::{
    ACCEPT_CHANGES, ANY_DIFF_NONZERO, ColumnNames, diff_column, diff_nonzero_column,
    updated_column,
};
use crate::error::{ConfigError, Result};
use crate::options::{DiffDirection, ManualOutlierPolicy};

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: ColumnNames,
    pub outliers: OutlierConfig,
    pub freezing: FreezingConfig,
}

impl PipelineConfig {
    /// Read and parse a TOML config file, validating the clip parameters.
    ///
    /// Freezing settings are checked by the reconciler when it runs, since an
    /// outlier-only config legitimately leaves them unset.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.outliers.validate()?;
        Ok(config)
    }
}

/// Settings for rank-based outlier clipping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierConfig {
    /// Fraction of each group flagged from the top of the ranking.
    pub upper_clip: f64,
    /// Fraction of each group flagged from the bottom of the ranking.
    pub lower_clip: f64,
    /// Value columns to examine, each flagged independently.
    pub flag_value_cols: Vec<String>,
    /// Selection type marking randomly sampled responses.
    pub sampled_marker: String,
    /// Status codes treated as cleared responses.
    pub clear_statuses: Vec<String>,
    pub manual_policy: ManualOutlierPolicy,
}

impl Default for OutlierConfig {
    fn default() -> Self {
        Self {
            upper_clip: 0.05,
            lower_clip: 0.0,
            flag_value_cols: Vec::new(),
            sampled_marker: "P".to_string(),
            clear_statuses: vec!["210".to_string(), "211".to_string()],
            manual_policy: ManualOutlierPolicy::default(),
        }
    }
}

impl OutlierConfig {
    /// Check the clip fractions.
    pub fn validate(&self) -> Result<()> {
        validate_clip_params(self.upper_clip, self.lower_clip)
    }
}

/// Both fractions must lie in `[0, 1)` and sum to less than 1.
pub fn validate_clip_params(upper_clip: f64, lower_clip: f64) -> Result<()> {
    for (name, value) in [("upper_clip", upper_clip), ("lower_clip", lower_clip)] {
        if !(0.0..1.0).contains(&value) {
            return Err(ConfigError::InvalidClip { name, value });
        }
    }
    if upper_clip + lower_clip >= 1.0 {
        return Err(ConfigError::ClipSumTooLarge {
            upper: upper_clip,
            lower: lower_clip,
        });
    }
    Ok(())
}

/// Settings for snapshot reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FreezingConfig {
    /// Columns identifying a record in both snapshots.
    pub key_columns: Vec<String>,
    /// Numeric columns compared between snapshots.
    pub tracked_columns: Vec<String>,
    /// Extra updated-side columns copied onto amendment rows for reviewers.
    pub carry_columns: Vec<String>,
    pub diff_direction: DiffDirection,
    pub survey: String,
    pub amendments_template: String,
    pub additions_template: String,
}

impl Default for FreezingConfig {
    fn default() -> Self {
        Self {
            key_columns: vec![
                "reference".to_string(),
                "period".to_string(),
                "instance".to_string(),
            ],
            tracked_columns: Vec::new(),
            carry_columns: Vec::new(),
            diff_direction: DiffDirection::default(),
            survey: "berd".to_string(),
            amendments_template: "{survey}_amendments_{date}_v{run_id}.csv".to_string(),
            additions_template: "{survey}_additions_{date}_v{run_id}.csv".to_string(),
        }
    }
}

impl FreezingConfig {
    pub fn validate(&self) -> Result<()> {
        if self.key_columns.is_empty() {
            return Err(ConfigError::EmptyKeyColumns);
        }
        if self.tracked_columns.is_empty() {
            return Err(ConfigError::EmptyTrackedColumns);
        }
        if let Some(column) = self
            .tracked_columns
            .iter()
            .find(|column| self.key_columns.contains(column))
        {
            return Err(ConfigError::KeyColumnTracked {
                column: column.clone(),
            });
        }
        self.validate_carry_columns()
    }

    /// Carry columns are appended to amendment rows, so none may repeat a
    /// key, a tracked column or a derived review column.
    fn validate_carry_columns(&self) -> Result<()> {
        for (idx, column) in self.carry_columns.iter().enumerate() {
            let reason = if self.carry_columns[..idx].contains(column) {
                Some("is listed more than once")
            } else if self.key_columns.contains(column) {
                Some("is a key column")
            } else if self.tracked_columns.contains(column) {
                Some("is a tracked column")
            } else if column == ACCEPT_CHANGES || column == ANY_DIFF_NONZERO {
                Some("is a review column")
            } else if self.tracked_columns.iter().any(|tracked| {
                *column == updated_column(tracked)
                    || *column == diff_column(tracked)
                    || *column == diff_nonzero_column(tracked)
            }) {
                Some("is a derived diff column")
            } else {
                None
            };
            if let Some(reason) = reason {
                return Err(ConfigError::InvalidCarryColumn {
                    column: column.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }

    pub fn amendments_file(&self, vars: &TemplateVars) -> Result<String> {
        render_template(&self.amendments_template, &self.survey, vars)
    }

    pub fn additions_file(&self, vars: &TemplateVars) -> Result<String> {
        render_template(&self.additions_template, &self.survey, vars)
    }
}

/// Per-run values substituted into output templates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateVars {
    /// Run date, already formatted (e.g. `24-05-30`).
    pub date: String,
    pub run_id: u32,
}

fn render_template(template: &str, survey: &str, vars: &TemplateVars) -> Result<String> {
    let invalid = |reason: String| ConfigError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };
    let mut out = String::with_capacity(template.len() + 16);
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| invalid("unclosed '{'".to_string()))?;
        match &after[..end] {
            "survey" => out.push_str(survey),
            "date" => out.push_str(&vars.date),
            "run_id" => out.push_str(&vars.run_id.to_string()),
            other => return Err(invalid(format!("unknown placeholder '{{{other}}}'"))),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_params_accept_valid_fractions() {
        assert!(validate_clip_params(0.05, 0.0).is_ok());
        assert!(validate_clip_params(0.0, 0.0).is_ok());
        assert!(validate_clip_params(0.4, 0.5).is_ok());
    }

    #[test]
    fn clip_params_reject_negative() {
        let err = validate_clip_params(-0.1, 0.0).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidClip {
                name: "upper_clip",
                ..
            }
        ));
    }

    #[test]
    fn clip_params_reject_one_and_nan() {
        assert!(validate_clip_params(1.0, 0.0).is_err());
        assert!(validate_clip_params(0.1, f64::NAN).is_err());
    }

    #[test]
    fn clip_params_reject_large_sum() {
        let err = validate_clip_params(0.6, 0.4).unwrap_err();
        assert!(matches!(err, ConfigError::ClipSumTooLarge { .. }));
    }

    #[test]
    fn render_substitutes_placeholders() {
        let vars = TemplateVars {
            date: "24-05-30".to_string(),
            run_id: 3,
        };
        let config = FreezingConfig::default();
        assert_eq!(
            config.amendments_file(&vars).unwrap(),
            "berd_amendments_24-05-30_v3.csv"
        );
        assert_eq!(
            config.additions_file(&vars).unwrap(),
            "berd_additions_24-05-30_v3.csv"
        );
    }

    #[test]
    fn render_rejects_unknown_placeholder() {
        let vars = TemplateVars {
            date: "d".to_string(),
            run_id: 1,
        };
        let err = render_template("{period}.csv", "berd", &vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTemplate { .. }));
        assert!(render_template("{survey.csv", "berd", &vars).is_err());
    }

    #[test]
    fn freezing_validate_requires_tracked_columns() {
        let config = FreezingConfig::default();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyTrackedColumns)
        ));
    }

    #[test]
    fn freezing_validate_rejects_tracked_key() {
        let config = FreezingConfig {
            tracked_columns: vec!["period".to_string()],
            ..FreezingConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::KeyColumnTracked { .. })
        ));
    }

    fn carrying(columns: &[&str]) -> FreezingConfig {
        FreezingConfig {
            tracked_columns: vec!["701".to_string()],
            carry_columns: columns.iter().map(|c| c.to_string()).collect(),
            ..FreezingConfig::default()
        }
    }

    #[test]
    fn freezing_validate_accepts_plain_carry_columns() {
        assert!(carrying(&["postcode", "cellnumber"]).validate().is_ok());
    }

    #[test]
    fn freezing_validate_rejects_clashing_carry_columns() {
        for (column, reason) in [
            ("reference", "is a key column"),
            ("701", "is a tracked column"),
            ("accept_changes", "is a review column"),
            ("is_any_diff_nonzero", "is a review column"),
            ("701_updated", "is a derived diff column"),
            ("701_diff", "is a derived diff column"),
            ("is_701_diff_nonzero", "is a derived diff column"),
        ] {
            let err = carrying(&[column]).validate().unwrap_err();
            assert!(
                matches!(
                    &err,
                    ConfigError::InvalidCarryColumn { column: c, reason: r } if c == column && *r == reason
                ),
                "{column}: {err}"
            );
        }
    }

    #[test]
    fn freezing_validate_rejects_repeated_carry_column() {
        let err = carrying(&["postcode", "postcode"]).validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "freezing.carry_columns entry 'postcode' is listed more than once"
        );
    }
}
