//! Similarity Ranker — top-k lookalikes by cosine similarity.

use crate::{
    error::{AnalyticsError, AnalyticsResult},
    feature_builder::FeatureTable,
    standardizer::standardize,
    types::CustomerId,
};
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

pub const DEFAULT_LOOKALIKES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub customer_id: CustomerId,
    /// Cosine similarity in [-1, 1].
    pub score: f64,
}

/// dot(a, b) / (|a| |b|), or 0 when either vector has zero norm.
pub fn cosine_similarity(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Rank every other customer by similarity to `query_customer_id`.
///
/// The scaler is fit over the whole table on each call. Ties keep table
/// order, and the query customer is never part of the result.
pub fn rank_lookalikes(
    features: &FeatureTable,
    query_customer_id: &str,
    k: usize,
) -> AnalyticsResult<Vec<Neighbor>> {
    if k == 0 {
        return Err(AnalyticsError::InvalidNeighborCount { k });
    }
    let query = features
        .row_index(query_customer_id)
        .ok_or_else(|| AnalyticsError::UnknownCustomer {
            customer_id: query_customer_id.to_string(),
        })?;

    let (scaled, _) = standardize(&features.schema, &features.rows)?;
    let query_row = scaled.values.row(query);

    let mut scored: Vec<(usize, f64)> = scaled
        .values
        .outer_iter()
        .enumerate()
        .map(|(i, row)| (i, cosine_similarity(query_row, row)))
        .collect();
    // sort_by is stable, so equal scores keep table order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let neighbors: Vec<Neighbor> = scored
        .into_iter()
        .filter(|(i, _)| *i != query)
        .take(k)
        .map(|(i, score)| Neighbor {
            customer_id: features.customer_ids[i].clone(),
            score,
        })
        .collect();

    log::debug!(
        "lookalikes: query={query_customer_id} k={k} returned={}",
        neighbors.len()
    );
    Ok(neighbors)
}
