//! Policy switches for behaviour the survey methodology leaves open.

use serde::{Deserialize, Serialize};

/// Which signed differences count as an amendment.
///
/// The legacy pipeline only compared `updated - original > 1e-5`, so a
/// decrease never registered as a change. That behaviour is kept as the
/// default until methodology confirms the intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffDirection {
    /// Flag only increases larger than the tolerance.
    #[default]
    IncreaseOnly,
    /// Flag increases and decreases larger than the tolerance.
    Either,
}

impl DiffDirection {
    /// Tolerance below which a difference is treated as unchanged.
    pub const TOLERANCE: f64 = 1e-5;

    /// Returns true when `diff` counts as a change under this policy.
    ///
    /// A missing (NaN) difference is never a change.
    pub fn is_change(self, diff: f64) -> bool {
        match self {
            Self::IncreaseOnly => diff > Self::TOLERANCE,
            Self::Either => diff.abs() > Self::TOLERANCE,
        }
    }
}

/// How `manual_outlier` combines with `auto_outlier` into the final flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManualOutlierPolicy {
    /// Ignore manual overrides; the final flag is `auto_outlier`.
    AutoOnly,
    /// A non-empty `manual_outlier` replaces `auto_outlier` for that row.
    #[default]
    ManualOverrides,
}

impl ManualOutlierPolicy {
    /// Resolve one row's final flag.
    pub fn resolve(self, auto: bool, manual: Option<bool>) -> bool {
        match (self, manual) {
            (Self::ManualOverrides, Some(manual)) => manual,
            _ => auto,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increase_only_ignores_decreases() {
        assert!(DiffDirection::IncreaseOnly.is_change(2.0));
        assert!(!DiffDirection::IncreaseOnly.is_change(-2.0));
        assert!(!DiffDirection::IncreaseOnly.is_change(1e-6));
    }

    #[test]
    fn either_flags_both_signs() {
        assert!(DiffDirection::Either.is_change(2.0));
        assert!(DiffDirection::Either.is_change(-2.0));
        assert!(!DiffDirection::Either.is_change(-1e-6));
    }

    #[test]
    fn nan_is_never_a_change() {
        assert!(!DiffDirection::IncreaseOnly.is_change(f64::NAN));
        assert!(!DiffDirection::Either.is_change(f64::NAN));
    }

    #[test]
    fn manual_overrides_wins_when_set() {
        let policy = ManualOutlierPolicy::ManualOverrides;
        assert!(policy.resolve(false, Some(true)));
        assert!(!policy.resolve(true, Some(false)));
        assert!(policy.resolve(true, None));
    }

    #[test]
    fn auto_only_ignores_manual() {
        let policy = ManualOutlierPolicy::AutoOnly;
        assert!(!policy.resolve(false, Some(true)));
        assert!(policy.resolve(true, Some(false)));
    }
}
