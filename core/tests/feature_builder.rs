//! Feature Builder tests.

mod common;

use common::{customer, product, synthetic_dataset, three_customer_dataset, txn};
use lookalike_core::{
    error::AnalyticsError,
    feature_builder::{build_features, Aggregate, FeatureTable},
};

fn features_of(ds: &lookalike_core::dataset::Dataset) -> FeatureTable {
    build_features(&ds.customers, &ds.transactions, &ds.products).unwrap()
}

// ── Tests ────────────────────────────────────────────────────────────────────

/// Spend [100, 50, 0], category A share [1, 0, 0].
#[test]
fn three_customer_fixture_matches_expected_values() {
    let features = features_of(&three_customer_dataset());

    assert_eq!(features.customer_ids, vec!["C1", "C2", "C3"]);
    assert_eq!(features.column("total_spend").unwrap(), vec![100.0, 50.0, 0.0]);
    assert_eq!(features.column("A").unwrap(), vec![1.0, 0.0, 0.0]);
    assert_eq!(features.column("B").unwrap(), vec![0.0, 1.0, 0.0]);
    assert_eq!(features.column("avg_transaction_value").unwrap(), vec![50.0, 50.0, 0.0]);
    assert_eq!(features.column("transaction_count").unwrap(), vec![2.0, 1.0, 0.0]);
    assert_eq!(features.column("total_quantity").unwrap(), vec![3.0, 1.0, 0.0]);
    assert_eq!(features.column("avg_quantity").unwrap(), vec![1.5, 1.0, 0.0]);
    assert!(features.row("C3").unwrap().iter().all(|&x| x == 0.0));
}

#[test]
fn schema_is_aggregates_then_sorted_categories() {
    let ds = lookalike_core::dataset::Dataset::new(
        vec![customer("C1", "Asia")],
        vec![
            product("P1", "Clothing", 10.0),
            product("P2", "Books", 10.0),
            product("P3", "Electronics", 10.0),
            product("P4", "Books", 20.0),
        ],
        vec![],
    );
    let features = features_of(&ds);

    let expected: Vec<&str> = Aggregate::ALL
        .iter()
        .map(|a| a.name())
        .chain(["Books", "Clothing", "Electronics"])
        .collect();
    assert_eq!(features.schema.names(), expected);
    assert_eq!(features.rows[0].len(), expected.len());
}

#[test]
fn customers_without_transactions_have_all_zero_rows() {
    let ds = synthetic_dataset(60, 11);
    let features = features_of(&ds);

    let mut checked = 0;
    for (id, row) in features.customer_ids.iter().zip(&features.rows) {
        if !ds.transactions.iter().any(|t| &t.customer_id == id) {
            assert!(row.iter().all(|&x| x == 0.0), "{id} should be all zeros: {row:?}");
            checked += 1;
        }
    }
    assert!(checked > 0, "fixture should contain customers without transactions");
}

#[test]
fn category_shares_sum_to_one_for_active_customers() {
    let ds = synthetic_dataset(60, 23);
    let features = features_of(&ds);
    let count_col = features.schema.index_of("transaction_count").unwrap();
    let share_cols: Vec<usize> = features
        .schema
        .categories()
        .map(|c| features.schema.index_of(c).unwrap())
        .collect();

    for (id, row) in features.customer_ids.iter().zip(&features.rows) {
        if row[count_col] > 0.0 {
            let total: f64 = share_cols.iter().map(|&j| row[j]).sum();
            assert!((total - 1.0).abs() < 1e-9, "{id}: shares sum to {total}");
        }
    }
}

#[test]
fn one_row_per_customer_in_customer_order() {
    let ds = synthetic_dataset(25, 5);
    let features = features_of(&ds);

    let ids: Vec<&str> = ds.customers.iter().map(|c| c.customer_id.as_str()).collect();
    assert_eq!(features.customer_ids, ids);
    assert_eq!(features.len(), 25);
    assert!(features.rows.iter().flatten().all(|x| x.is_finite()));
}

/// Shares are fractions of the transaction count, not of quantity or spend.
#[test]
fn category_shares_count_transactions_not_quantity() {
    let ds = lookalike_core::dataset::Dataset::new(
        vec![customer("C1", "Asia")],
        vec![product("P1", "A", 1.0), product("P2", "B", 500.0)],
        vec![
            txn("C1", "P1", 10, 10.0, "2024-01-01"),
            txn("C1", "P2", 1, 500.0, "2024-01-02"),
        ],
    );
    let features = features_of(&ds);

    assert_eq!(features.value("C1", "A").unwrap(), 0.5);
    assert_eq!(features.value("C1", "B").unwrap(), 0.5);
    assert_eq!(features.value("C1", "avg_quantity").unwrap(), 5.5);
}

#[test]
fn orphan_transactions_are_excluded_everywhere() {
    let mut ds = three_customer_dataset();
    ds.transactions.push(txn("C2", "P-unknown", 3, 999.0, "2024-01-07"));
    ds.transactions.push(txn("C-unknown", "P1", 1, 30.0, "2024-01-07"));
    let features = features_of(&ds);

    assert_eq!(features.column("total_spend").unwrap(), vec![100.0, 50.0, 0.0]);
    assert_eq!(features.value("C2", "transaction_count").unwrap(), 1.0);
    assert_eq!(features.value("C2", "B").unwrap(), 1.0);
    assert_eq!(features.len(), 3);
}

#[test]
fn empty_customer_table_is_an_error() {
    let ds = three_customer_dataset();
    let err = build_features(&[], &ds.transactions, &ds.products).unwrap_err();
    assert!(matches!(err, AnalyticsError::EmptyPopulation), "got {err:?}");
}

#[test]
fn duplicate_customer_ids_are_rejected() {
    let mut ds = three_customer_dataset();
    ds.customers.push(customer("C2", "Asia"));
    let err = build_features(&ds.customers, &ds.transactions, &ds.products).unwrap_err();
    assert!(
        matches!(err, AnalyticsError::DuplicateCustomer { ref customer_id } if customer_id == "C2"),
        "got {err:?}"
    );
}

#[test]
fn unknown_feature_column_is_reported() {
    let features = features_of(&three_customer_dataset());
    let err = features.column("lifetime_value").unwrap_err();
    assert!(
        matches!(err, AnalyticsError::MissingColumn { ref column, .. } if column == "lifetime_value"),
        "got {err:?}"
    );
    assert!(matches!(
        features.row("C9").unwrap_err(),
        AnalyticsError::UnknownCustomer { .. }
    ));
}
