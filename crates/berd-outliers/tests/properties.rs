//! Property tests for band sizing and flag counts.

use polars::prelude::*;
use proptest::prelude::*;

use berd_model::{AUTO_OUTLIER, ColumnNames, OutlierConfig};
use berd_outliers::{band_sizes, flag_outliers, round_half_up};

proptest! {
    #[test]
    fn upper_band_is_monotonic_in_clip(n in 1usize..500, a in 0.0f64..0.99, b in 0.0f64..0.99) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let smaller = band_sizes(n, low, 0.0);
        let larger = band_sizes(n, high, 0.0);
        prop_assert!(smaller.upper_band_size <= larger.upper_band_size);
        prop_assert!(smaller.upper_threshold_rank >= larger.upper_threshold_rank);
    }

    #[test]
    fn round_half_up_is_within_half(x in 0.0f64..1.0e6) {
        let rounded = round_half_up(x) as f64;
        prop_assert!((rounded - x).abs() <= 0.5);
        prop_assert!(rounded >= x.floor());
    }

    #[test]
    fn flagging_twice_is_identical(values in prop::collection::vec(1u32..1000, 1..40)) {
        let n = values.len();
        let df = DataFrame::new(vec![
            Series::new(
                "reference".into(),
                (0..n).map(|i| format!("R{i}")).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new("period".into(), vec![202112i64; n]).into_column(),
            Series::new(
                "cellnumber".into(),
                (0..n).map(|i| (i % 3) as i64).collect::<Vec<_>>(),
            )
            .into_column(),
            Series::new("selectiontype".into(), vec!["P"; n]).into_column(),
            Series::new("statusencoded".into(), vec!["211"; n]).into_column(),
            Series::new(
                "701".into(),
                values.iter().map(|v| f64::from(*v)).collect::<Vec<_>>(),
            )
            .into_column(),
        ])
        .unwrap();
        let config = OutlierConfig {
            upper_clip: 0.1,
            lower_clip: 0.05,
            flag_value_cols: vec!["701".to_string()],
            ..OutlierConfig::default()
        };

        let first = flag_outliers(&df, &config, &ColumnNames::default()).unwrap();
        let second = flag_outliers(&first.data, &config, &ColumnNames::default()).unwrap();

        let a: Vec<Option<bool>> = first.data.column(AUTO_OUTLIER).unwrap().bool().unwrap().into_iter().collect();
        let b: Vec<Option<bool>> = second.data.column(AUTO_OUTLIER).unwrap().bool().unwrap().into_iter().collect();
        prop_assert_eq!(a, b);
    }
}
