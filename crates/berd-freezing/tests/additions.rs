//! Tests for detecting new records and appending accepted ones.

use polars::prelude::*;

use berd_freezing::{FreezingError, apply_additions, get_additions};
use berd_model::FreezingConfig;

fn snapshot(references: &[&str], values: &[f64]) -> DataFrame {
    let n = references.len();
    DataFrame::new(vec![
        Series::new("reference".into(), references.to_vec()).into_column(),
        Series::new("period".into(), vec![202012i64; n]).into_column(),
        Series::new("instance".into(), vec![0i64; n]).into_column(),
        Series::new("701".into(), values.to_vec()).into_column(),
        Series::new("postcode".into(), vec!["NP10"; n]).into_column(),
    ])
    .unwrap()
}

fn config() -> FreezingConfig {
    FreezingConfig {
        tracked_columns: vec!["701".to_string()],
        ..FreezingConfig::default()
    }
}

fn references(df: &DataFrame) -> Vec<String> {
    df.column("reference")
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect()
}

#[test]
fn new_key_becomes_addition() {
    let baseline = snapshot(&["A", "B"], &[5.0, 3.0]);
    let updated = snapshot(&["A", "B", "Z"], &[5.0, 3.0, 4.0]);

    let additions = get_additions(&baseline, &updated, &config())
        .unwrap()
        .expect("one addition");

    assert_eq!(references(&additions), vec!["Z"]);
    assert_eq!(additions.width(), updated.width() + 1);
    assert_eq!(
        additions.column("accept_changes").unwrap().bool().unwrap().get(0),
        Some(false)
    );
    assert_eq!(additions.column("701").unwrap().f64().unwrap().get(0), Some(4.0));
}

#[test]
fn same_reference_in_new_period_is_an_addition() {
    let baseline = snapshot(&["A"], &[5.0]);
    let mut updated = snapshot(&["A"], &[5.0]);
    updated
        .with_column(Series::new("period".into(), vec![202112i64]))
        .unwrap();

    let additions = get_additions(&baseline, &updated, &config()).unwrap();
    assert_eq!(additions.map(|df| df.height()), Some(1));
}

#[test]
fn no_new_keys_give_none() {
    let baseline = snapshot(&["A", "B"], &[5.0, 3.0]);
    let updated = snapshot(&["B"], &[9.0]);
    assert!(get_additions(&baseline, &updated, &config()).unwrap().is_none());
}

#[test]
fn accepted_additions_are_appended_in_baseline_shape() {
    let baseline = snapshot(&["A"], &[5.0]);
    let reviewed = DataFrame::new(vec![
        Series::new("reference".into(), vec!["Z", "Y"]).into_column(),
        Series::new("period".into(), vec![202012i64, 202012]).into_column(),
        Series::new("instance".into(), vec![0i64, 0]).into_column(),
        Series::new("701".into(), vec![4i64, 2]).into_column(),
        Series::new("note".into(), vec!["checked", "checked"]).into_column(),
        Series::new("accept_changes".into(), vec!["True", "False"]).into_column(),
    ])
    .unwrap();

    let applied = apply_additions(&baseline, &reviewed, &config()).unwrap();

    assert_eq!(references(&applied), vec!["A", "Z"]);
    assert_eq!(
        applied.get_column_names_owned(),
        baseline.get_column_names_owned()
    );
    assert_eq!(applied.column("701").unwrap().f64().unwrap().get(1), Some(4.0));
    assert_eq!(applied.column("postcode").unwrap().null_count(), 1);
}

#[test]
fn nothing_accepted_leaves_baseline_unchanged() {
    let baseline = snapshot(&["A"], &[5.0]);
    let updated = snapshot(&["A", "Z"], &[5.0, 4.0]);
    let additions = get_additions(&baseline, &updated, &config()).unwrap().unwrap();

    let applied = apply_additions(&baseline, &additions, &config()).unwrap();
    assert!(applied.equals_missing(&baseline));
}

#[test]
fn already_frozen_keys_are_not_duplicated() {
    let baseline = snapshot(&["A"], &[5.0]);
    let mut reviewed = snapshot(&["A", "Z", "Z"], &[6.0, 4.0, 4.0]);
    reviewed
        .with_column(Series::new("accept_changes".into(), vec![true, true, true]))
        .unwrap();

    let applied = apply_additions(&baseline, &reviewed, &config()).unwrap();
    assert_eq!(references(&applied), vec!["A", "Z"]);
    assert_eq!(applied.column("701").unwrap().f64().unwrap().get(0), Some(5.0));
}

#[test]
fn fractional_addition_widens_integer_baseline() {
    let mut baseline = snapshot(&["A"], &[5.0]);
    baseline
        .with_column(Series::new("701".into(), vec![5i64]))
        .unwrap();
    let mut reviewed = snapshot(&["Z"], &[4.5]);
    reviewed
        .with_column(Series::new("accept_changes".into(), vec![true]))
        .unwrap();

    let applied = apply_additions(&baseline, &reviewed, &config()).unwrap();

    let values = applied.column("701").unwrap();
    assert_eq!(values.dtype(), &DataType::Float64);
    let values: Vec<Option<f64>> = values.f64().unwrap().into_iter().collect();
    assert_eq!(values, vec![Some(5.0), Some(4.5)]);
}

#[test]
fn whole_addition_keeps_integer_baseline() {
    let mut baseline = snapshot(&["A"], &[5.0]);
    baseline
        .with_column(Series::new("701".into(), vec![5i64]))
        .unwrap();
    let mut reviewed = snapshot(&["Z"], &[4.0]);
    reviewed
        .with_column(Series::new("accept_changes".into(), vec![true]))
        .unwrap();

    let applied = apply_additions(&baseline, &reviewed, &config()).unwrap();

    let values = applied.column("701").unwrap().i64().unwrap();
    assert_eq!(values.get(1), Some(4));
}

#[test]
fn text_in_numeric_column_is_rejected() {
    let baseline = snapshot(&["A"], &[5.0]);
    let reviewed = DataFrame::new(vec![
        Series::new("reference".into(), vec!["Z"]).into_column(),
        Series::new("period".into(), vec![202012i64]).into_column(),
        Series::new("instance".into(), vec![0i64]).into_column(),
        Series::new("701".into(), vec!["four"]).into_column(),
        Series::new("accept_changes".into(), vec![true]).into_column(),
    ])
    .unwrap();

    let err = apply_additions(&baseline, &reviewed, &config()).unwrap_err();
    assert!(matches!(
        err,
        FreezingError::IncompatibleValues { ref column, lost: 1, .. } if column == "701"
    ));
}
