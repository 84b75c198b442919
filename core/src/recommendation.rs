//! Product recommendations from a lookalike set.
//!
//! Recommended = products bought by any neighbor − products the query
//! customer already bought, restricted to the product table and returned in
//! product-table order.

use crate::{
    dataset::{Dataset, ProductRecord},
    error::{AnalyticsError, AnalyticsResult},
    similarity::Neighbor,
};
use std::collections::HashSet;

pub fn recommend_products(
    dataset: &Dataset,
    query_customer_id: &str,
    neighbors: &[Neighbor],
) -> AnalyticsResult<Vec<ProductRecord>> {
    if !dataset.has_customer(query_customer_id) {
        return Err(AnalyticsError::UnknownCustomer {
            customer_id: query_customer_id.to_string(),
        });
    }

    let neighbor_ids: HashSet<&str> = neighbors.iter().map(|n| n.customer_id.as_str()).collect();
    let mut owned: HashSet<&str> = HashSet::new();
    let mut candidates: HashSet<&str> = HashSet::new();
    for t in &dataset.transactions {
        if t.customer_id == query_customer_id {
            owned.insert(t.product_id.as_str());
        } else if neighbor_ids.contains(t.customer_id.as_str()) {
            candidates.insert(t.product_id.as_str());
        }
    }

    let mut seen: HashSet<&str> = HashSet::new();
    let recommended: Vec<ProductRecord> = dataset
        .products
        .iter()
        .filter(|p| {
            let id = p.product_id.as_str();
            candidates.contains(id) && !owned.contains(id) && seen.insert(id)
        })
        .cloned()
        .collect();

    log::debug!(
        "recommendations: query={query_customer_id} neighbors={} products={}",
        neighbors.len(),
        recommended.len()
    );
    Ok(recommended)
}
