//! Band sizes for rank-based clipping.

/// Round half away from zero for non-negative input: `2.5 -> 3`, `2.49 -> 2`.
///
/// # Examples
///
/// ```
/// use berd_outliers::round_half_up;
///
/// assert_eq!(round_half_up(2.5), 3);
/// assert_eq!(round_half_up(2.49), 2);
/// assert_eq!(round_half_up(2.0), 2);
/// ```
pub fn round_half_up(x: f64) -> usize {
    let floor = x.floor();
    let rounded = if x - floor < 0.5 { floor } else { floor + 1.0 };
    rounded.max(0.0) as usize
}

/// Band sizes for one group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandSizes {
    pub group_count: usize,
    pub upper_band_size: usize,
    /// Ranks strictly above this are upper outliers.
    pub upper_threshold_rank: usize,
    /// Ranks at or below this are lower outliers.
    pub lower_band_size: usize,
}

impl BandSizes {
    /// Whether the 1-based `rank` falls in either tail.
    pub fn is_outlier(&self, rank: usize) -> bool {
        rank > self.upper_threshold_rank || rank <= self.lower_band_size
    }
}

/// Compute band sizes for a group of `group_count` valid rows.
///
/// Clip fractions are assumed validated; `upper_band_size` never exceeds the
/// group so the threshold cannot underflow.
pub fn band_sizes(group_count: usize, upper_clip: f64, lower_clip: f64) -> BandSizes {
    let n = group_count as f64;
    let upper_band_size = round_half_up(n * upper_clip).min(group_count);
    BandSizes {
        group_count,
        upper_band_size,
        upper_threshold_rank: group_count - upper_band_size,
        lower_band_size: round_half_up(n * lower_clip),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_half_up_is_not_bankers_rounding() {
        assert_eq!(round_half_up(0.5), 1);
        assert_eq!(round_half_up(1.5), 2);
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(3.5), 4);
    }

    #[test]
    fn round_half_up_below_half() {
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(0.0), 0);
        assert_eq!(round_half_up(0.49999), 0);
    }

    #[test]
    fn bands_for_ten_rows() {
        let bands = band_sizes(10, 0.1, 0.0);
        assert_eq!(bands.upper_band_size, 1);
        assert_eq!(bands.upper_threshold_rank, 9);
        assert_eq!(bands.lower_band_size, 0);
        assert!(bands.is_outlier(10));
        assert!(!bands.is_outlier(9));
        assert!(!bands.is_outlier(1));
    }

    #[test]
    fn bands_round_half_up_on_both_tails() {
        // 5 * 0.1 = 0.5 rounds up to one row in each tail
        let bands = band_sizes(5, 0.1, 0.1);
        assert_eq!(bands.upper_band_size, 1);
        assert_eq!(bands.lower_band_size, 1);
        assert!(bands.is_outlier(1));
        assert!(bands.is_outlier(5));
        assert!(!bands.is_outlier(3));
    }

    #[test]
    fn zero_clip_flags_nothing() {
        let bands = band_sizes(5, 0.0, 0.0);
        assert!((1..=5).all(|rank| !bands.is_outlier(rank)));
    }

    #[test]
    fn single_row_group() {
        let bands = band_sizes(1, 0.05, 0.0);
        assert_eq!(bands.upper_band_size, 0);
        assert_eq!(bands.upper_threshold_rank, 1);
        assert!(!bands.is_outlier(1));
    }
}
