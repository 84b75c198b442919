//! Dataset summary — headline metrics and the distributions behind the
//! region, category and daily-value charts.

use crate::dataset::Dataset;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub total_customers:           usize,
    pub total_products:            usize,
    pub total_transactions:        usize,
    pub total_revenue:             f64,
    /// None when there are no transactions.
    pub average_transaction_value: Option<f64>,
    pub most_common_region:        Option<String>,
    /// Most frequent category in the product catalogue.
    pub most_popular_category:     Option<String>,
    pub customers_by_region:       BTreeMap<String, usize>,
    pub products_by_category:      BTreeMap<String, usize>,
    /// Total transaction value per UTC calendar day.
    pub daily_transaction_value:   BTreeMap<NaiveDate, f64>,
}

pub fn summarize(dataset: &Dataset) -> DatasetSummary {
    let mut customers_by_region = BTreeMap::new();
    for c in &dataset.customers {
        *customers_by_region.entry(c.region.clone()).or_insert(0) += 1;
    }

    let mut products_by_category = BTreeMap::new();
    for p in &dataset.products {
        *products_by_category.entry(p.category.clone()).or_insert(0) += 1;
    }

    let mut daily_transaction_value = BTreeMap::new();
    let mut total_revenue = 0.0;
    for t in &dataset.transactions {
        total_revenue += t.total_value;
        *daily_transaction_value
            .entry(t.transaction_date.date_naive())
            .or_insert(0.0) += t.total_value;
    }

    let total_transactions = dataset.transactions.len();
    let average_transaction_value =
        (total_transactions > 0).then(|| total_revenue / total_transactions as f64);

    DatasetSummary {
        total_customers: dataset.customers.len(),
        total_products: dataset.products.len(),
        total_transactions,
        total_revenue,
        average_transaction_value,
        most_common_region: mode(&customers_by_region),
        most_popular_category: mode(&products_by_category),
        customers_by_region,
        products_by_category,
        daily_transaction_value,
    }
}

/// Highest count wins; ties go to the smallest key.
fn mode(counts: &BTreeMap<String, usize>) -> Option<String> {
    let mut best: Option<(&String, usize)> = None;
    for (key, &count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((key, count));
        }
    }
    best.map(|(key, _)| key.clone())
}
