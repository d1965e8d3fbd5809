//! Integration test: loading, derived totals and the typed records

use polars::prelude::*;
use spending_tuner::data::{
    records, split_features, summarize, DataLoader, CATEGORY_COLUMNS, DATE_COLUMN, N_CATEGORIES,
    REGION_COLUMN, TARGET_COLUMN,
};
use tempfile::TempDir;

fn regional_frame() -> DataFrame {
    let dates = ["2020-01-13", "2020-01-13", "2020-01-14", "2020-01-14", "2020-01-15"];
    let regions = [1i64, 6, 1, 6, 1];

    let mut columns: Vec<Column> = vec![
        Series::new(DATE_COLUMN.into(), &dates).into(),
        Series::new(REGION_COLUMN.into(), &regions).into(),
    ];
    for (j, name) in CATEGORY_COLUMNS.iter().enumerate() {
        let values: Vec<Option<f64>> = (0..dates.len())
            .map(|i| if i == 4 && j == 2 { None } else { Some(i as f64 * 0.5 - j as f64 * 0.25) })
            .collect();
        columns.push(Series::new((*name).into(), values).into());
    }
    columns.push(Series::new(TARGET_COLUMN.into(), vec![-1.0f64; dates.len()]).into());
    DataFrame::new(columns).unwrap()
}

fn write(dir: &TempDir, df: &mut DataFrame) -> std::path::PathBuf {
    let path = dir.path().join("spending.csv");
    DataLoader::new().write_csv(df, &path).unwrap();
    path
}

#[test]
fn test_total_is_row_sum_of_categories() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, &mut regional_frame());

    let df = DataLoader::new().load_csv(&path).unwrap();
    let rows = records(&df).unwrap();
    let totals = df.column(TARGET_COLUMN).unwrap().f64().unwrap().clone();

    assert_eq!(rows.len(), 5);
    for (i, row) in rows.iter().enumerate() {
        let sum: f64 = row.categories().iter().sum();
        assert!((row.total_spending() - sum).abs() < 1e-12);
        assert!((totals.get(i).unwrap() - sum).abs() < 1e-12, "row {}", i);
    }

    // The null category counts as zero
    let expected: f64 = (0..N_CATEGORIES)
        .filter(|&j| j != 2)
        .map(|j| 4.0 * 0.5 - j as f64 * 0.25)
        .sum();
    assert!((totals.get(4).unwrap() - expected).abs() < 1e-12);
}

#[test]
fn test_summary_counts_dates_and_regions() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, &mut regional_frame());

    let df = DataLoader::new().load_csv(&path).unwrap();
    let summary = summarize(&records(&df).unwrap());

    assert_eq!(summary.n_rows, 5);
    assert_eq!(summary.n_dates, 3);
    assert_eq!(summary.n_regions, 2);
    assert_eq!(summary.first_date.as_deref(), Some("2020-01-13"));
    assert_eq!(summary.last_date.as_deref(), Some("2020-01-15"));
}

#[test]
fn test_write_back_is_stable() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, &mut regional_frame());
    let loader = DataLoader::new();

    let mut first = loader.load_csv(&path).unwrap();
    loader.write_csv(&mut first, &path).unwrap();
    let second = loader.load_csv(&path).unwrap();

    assert_eq!(first.height(), second.height());
    let a = first.column(TARGET_COLUMN).unwrap().f64().unwrap().clone();
    let b = second.column(TARGET_COLUMN).unwrap().f64().unwrap().clone();
    assert!(a.into_iter().zip(b.into_iter()).all(|(x, y)| x == y));
}

#[test]
fn test_features_exclude_date_and_target() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, &mut regional_frame());

    let df = DataLoader::new().load_csv(&path).unwrap();
    let set = split_features(&df).unwrap();

    assert_eq!(set.features.ncols(), 1 + N_CATEGORIES);
    assert!(!set.features.columns().iter().any(|c| c == DATE_COLUMN || c == TARGET_COLUMN));
    assert_eq!(set.features.columns()[0], REGION_COLUMN);
    assert_eq!(set.dates.len(), set.target.len());
    assert!(set.features.values()[[4, 3]].is_nan());
}
