//! Standardizer tests.

mod common;

use common::{customer, mean, population_std, product, synthetic_dataset, txn};
use lookalike_core::{
    dataset::Dataset,
    error::AnalyticsError,
    feature_builder::{build_features, FeatureSchema},
    standardizer::standardize,
};
use ndarray::Array2;

fn column(values: &Array2<f64>, j: usize) -> Vec<f64> {
    values.column(j).to_vec()
}

#[test]
fn non_constant_columns_have_zero_mean_unit_std() {
    let ds = synthetic_dataset(80, 3);
    let features = build_features(&ds.customers, &ds.transactions, &ds.products).unwrap();
    let (scaled, params) = standardize(&features.schema, &features.rows).unwrap();

    assert_eq!(scaled.schema, features.schema);
    assert_eq!(scaled.len(), features.len());
    for j in 0..features.schema.len() {
        let col = column(&scaled.values, j);
        if params.constant[j] {
            assert!(col.iter().all(|&x| x == 0.0));
            continue;
        }
        assert!(mean(&col).abs() < 1e-9, "column {j} mean {}", mean(&col));
        assert!(
            (population_std(&col) - 1.0).abs() < 1e-9,
            "column {j} std {}",
            population_std(&col)
        );
    }
}

#[test]
fn constant_column_maps_to_zeros() {
    let schema = FeatureSchema::for_categories(["Books"]);
    let rows: Vec<Vec<f64>> = (0..4)
        .map(|i| vec![i as f64, 0.1, 7.0, i as f64 * 2.0, 0.3, 0.0])
        .collect();
    let (scaled, params) = standardize(&schema, &rows).unwrap();

    for j in [1, 2, 4, 5] {
        assert!(params.constant[j], "column {j} should be constant");
        assert_eq!(params.scales[j], 1.0);
        assert!(column(&scaled.values, j).iter().all(|&x| x == 0.0));
    }
    assert!(!params.constant[0]);
    assert!((params.means[0] - 1.5).abs() < 1e-12);
    assert!((params.scales[0] - 1.25f64.sqrt()).abs() < 1e-12);
}

/// A repeated value whose binary form is inexact still counts as constant.
#[test]
fn repeated_inexact_value_is_constant() {
    let schema = FeatureSchema::for_categories(["Books"]);
    for (value, n) in [(0.7, 1000), (1.0 / 3.0, 5000), (123.45, 2500)] {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![value, i as f64, value, value, value, 0.0])
            .collect();
        let (scaled, params) = standardize(&schema, &rows).unwrap();

        for j in [0, 2, 3, 4, 5] {
            assert!(params.constant[j], "column {j} of {value} x{n} not constant");
            assert_eq!(params.scales[j], 1.0);
            assert!(
                column(&scaled.values, j).iter().all(|&x| x == 0.0),
                "column {j} of {value} x{n} not all zero"
            );
        }
        assert!(!params.constant[1]);
    }
}

#[test]
fn equal_spenders_get_zero_scaled_total_spend() {
    let customers: Vec<_> = (0..1000).map(|i| customer(&format!("C{i:04}"), "Asia")).collect();
    let transactions: Vec<_> = customers
        .iter()
        .map(|c| txn(&c.customer_id, "P1", 1, 0.7, "2024-01-01"))
        .collect();
    let ds = Dataset::new(customers, vec![product("P1", "Books", 0.7)], transactions);
    let features = build_features(&ds.customers, &ds.transactions, &ds.products).unwrap();
    let (scaled, params) = standardize(&features.schema, &features.rows).unwrap();

    let j = features.schema.index_of("total_spend").unwrap();
    assert!(params.constant[j]);
    assert!(column(&scaled.values, j).iter().all(|&x| x == 0.0));
    assert!(scaled.values.iter().all(|&x| x == 0.0), "every feature is shared");
}

#[test]
fn each_call_is_an_independent_fit() {
    let schema = FeatureSchema::for_categories(Vec::<String>::new());
    let all: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64; 5]).collect();

    let (_, full) = standardize(&schema, &all).unwrap();
    let (_, half) = standardize(&schema, &all[..3]).unwrap();
    assert!((full.means[0] - 2.5).abs() < 1e-12);
    assert!((half.means[0] - 1.0).abs() < 1e-12);
}

#[test]
fn empty_input_is_an_error() {
    let schema = FeatureSchema::for_categories(["A"]);
    let err = standardize(&schema, &[]).unwrap_err();
    assert!(matches!(err, AnalyticsError::EmptyPopulation), "got {err:?}");
}

#[test]
fn row_width_must_match_schema() {
    let schema = FeatureSchema::for_categories(["A", "B"]);
    let rows = vec![vec![0.0; 7], vec![0.0; 6]];
    let err = standardize(&schema, &rows).unwrap_err();
    assert!(
        matches!(err, AnalyticsError::SchemaMismatch { expected: 7, actual: 6 }),
        "got {err:?}"
    );
}
