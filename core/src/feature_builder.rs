//! Feature Builder — one numeric feature row per customer.
//!
//! Steps:
//!   1. Join transactions to products to attach the category
//!   2. Aggregate spend and quantity per customer
//!   3. Turn per-category transaction counts into fractions of the
//!      customer's transaction count
//!   4. Emit a row for every customer, zero-filled when nothing joined
//!
//! Orphan transactions (unknown customer or product) never join and are
//! excluded from every aggregate.

use crate::{
    dataset::{CustomerRecord, ProductRecord, TransactionRecord},
    error::{AnalyticsError, AnalyticsResult},
    types::CustomerId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Name used for the feature table in MissingColumn errors.
pub const FEATURE_TABLE: &str = "features";

// ── Schema ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregate {
    TotalSpend,
    AvgTransactionValue,
    TransactionCount,
    TotalQuantity,
    AvgQuantity,
}

impl Aggregate {
    /// Column order of the aggregate block. Never reorder.
    pub const ALL: [Aggregate; 5] = [
        Aggregate::TotalSpend,
        Aggregate::AvgTransactionValue,
        Aggregate::TransactionCount,
        Aggregate::TotalQuantity,
        Aggregate::AvgQuantity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::TotalSpend          => "total_spend",
            Self::AvgTransactionValue => "avg_transaction_value",
            Self::TransactionCount    => "transaction_count",
            Self::TotalQuantity       => "total_quantity",
            Self::AvgQuantity         => "avg_quantity",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum FeatureColumn {
    Aggregate(Aggregate),
    /// Fraction of the customer's transactions in this product category.
    CategoryShare(String),
}

impl FeatureColumn {
    pub fn name(&self) -> &str {
        match self {
            Self::Aggregate(a)     => a.name(),
            Self::CategoryShare(c) => c,
        }
    }
}

/// The ordered column list for one Feature Builder invocation:
/// the five aggregates, then one share column per category in sorted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<FeatureColumn>,
}

impl FeatureSchema {
    pub fn for_categories<I, S>(categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let sorted: BTreeSet<String> = categories.into_iter().map(Into::into).collect();
        let columns = Aggregate::ALL
            .iter()
            .copied()
            .map(FeatureColumn::Aggregate)
            .chain(sorted.into_iter().map(FeatureColumn::CategoryShare))
            .collect();
        Self { columns }
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn columns(&self) -> &[FeatureColumn] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(FeatureColumn::name).collect()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name() == name)
    }

    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().filter_map(|c| match c {
            FeatureColumn::CategoryShare(name) => Some(name.as_str()),
            FeatureColumn::Aggregate(_) => None,
        })
    }
}

// ── Feature table ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureTable {
    pub schema:       FeatureSchema,
    /// Row order follows the customer table.
    pub customer_ids: Vec<CustomerId>,
    pub rows:         Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_index(&self, customer_id: &str) -> Option<usize> {
        self.customer_ids.iter().position(|id| id == customer_id)
    }

    pub fn row(&self, customer_id: &str) -> AnalyticsResult<&[f64]> {
        self.row_index(customer_id)
            .map(|i| self.rows[i].as_slice())
            .ok_or_else(|| AnalyticsError::UnknownCustomer {
                customer_id: customer_id.to_string(),
            })
    }

    pub fn value(&self, customer_id: &str, column: &str) -> AnalyticsResult<f64> {
        let col = self.column_index(column)?;
        Ok(self.row(customer_id)?[col])
    }

    pub fn column(&self, column: &str) -> AnalyticsResult<Vec<f64>> {
        let col = self.column_index(column)?;
        Ok(self.rows.iter().map(|r| r[col]).collect())
    }

    fn column_index(&self, column: &str) -> AnalyticsResult<usize> {
        self.schema
            .index_of(column)
            .ok_or_else(|| AnalyticsError::MissingColumn {
                table: FEATURE_TABLE.to_string(),
                column: column.to_string(),
            })
    }
}

// ── Builder ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
struct CustomerAccumulator {
    spend:           f64,
    quantity:        u64,
    txn_count:       u64,
    category_counts: Vec<u64>,
}

pub fn build_features(
    customers: &[CustomerRecord],
    transactions: &[TransactionRecord],
    products: &[ProductRecord],
) -> AnalyticsResult<FeatureTable> {
    if customers.is_empty() {
        return Err(AnalyticsError::EmptyPopulation);
    }

    let mut row_of: HashMap<&str, usize> = HashMap::with_capacity(customers.len());
    for (i, c) in customers.iter().enumerate() {
        if row_of.insert(c.customer_id.as_str(), i).is_some() {
            return Err(AnalyticsError::DuplicateCustomer {
                customer_id: c.customer_id.clone(),
            });
        }
    }

    let schema = FeatureSchema::for_categories(products.iter().map(|p| p.category.as_str()));
    let category_slot: HashMap<&str, usize> = schema
        .categories()
        .enumerate()
        .map(|(i, name)| (name, i))
        .collect();
    let n_categories = category_slot.len();

    // First product row wins when an id repeats.
    let mut category_of: HashMap<&str, usize> = HashMap::with_capacity(products.len());
    for p in products {
        category_of
            .entry(p.product_id.as_str())
            .or_insert(category_slot[p.category.as_str()]);
    }

    let mut acc = vec![
        CustomerAccumulator {
            category_counts: vec![0; n_categories],
            ..Default::default()
        };
        customers.len()
    ];

    let mut orphans = 0usize;
    for t in transactions {
        let (Some(&row), Some(&slot)) = (
            row_of.get(t.customer_id.as_str()),
            category_of.get(t.product_id.as_str()),
        ) else {
            orphans += 1;
            continue;
        };
        let a = &mut acc[row];
        a.spend += t.total_value;
        a.quantity += t.quantity as u64;
        a.txn_count += 1;
        a.category_counts[slot] += 1;
    }

    if orphans > 0 {
        log::debug!("features: skipped {orphans} orphan transactions");
    }

    let rows: Vec<Vec<f64>> = acc.iter().map(|a| feature_row(a, schema.len())).collect();

    log::debug!(
        "features: {} customers x {} columns ({} categories)",
        rows.len(),
        schema.len(),
        n_categories
    );

    Ok(FeatureTable {
        schema,
        customer_ids: customers.iter().map(|c| c.customer_id.clone()).collect(),
        rows,
    })
}

fn feature_row(a: &CustomerAccumulator, width: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(width);
    if a.txn_count == 0 {
        row.resize(width, 0.0);
        return row;
    }
    let n = a.txn_count as f64;
    for agg in Aggregate::ALL {
        row.push(match agg {
            Aggregate::TotalSpend          => a.spend,
            Aggregate::AvgTransactionValue => a.spend / n,
            Aggregate::TransactionCount    => n,
            Aggregate::TotalQuantity       => a.quantity as f64,
            Aggregate::AvgQuantity         => a.quantity as f64 / n,
        });
    }
    row.extend(a.category_counts.iter().map(|&c| c as f64 / n));
    row
}
