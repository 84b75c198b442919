//! Cluster Engine — k-means segmentation with a Davies–Bouldin score.
//!
//! Each call:
//!   1. Standardizes the feature table (fresh fit)
//!   2. Refuses partitions that must leave a cluster empty (fewer distinct
//!      rows than clusters)
//!   3. Fits linfa's k-means: `n_init` k-means++ seeded runs drawn from the
//!      `ClusterInit` stream, lowest inertia kept
//!   4. Scores the labels with the Davies–Bouldin index
//!
//! Identical input and identical seed produce identical labels.

use crate::{
    config::SegmentationConfig,
    error::{AnalyticsError, AnalyticsResult},
    feature_builder::{FeatureSchema, FeatureTable},
    rng::{RngBank, StreamSlot},
    standardizer::standardize,
    types::{ClusterLabel, CustomerId},
};
use linfa::prelude::*;
use linfa_clustering::{KMeans, KMeansInit};
use linfa_nn::distance::L2Dist;
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ── Public types ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    pub customer_id: CustomerId,
    pub cluster:     ClusterLabel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationOutcome {
    pub schema:         FeatureSchema,
    pub n_clusters:     usize,
    /// One entry per customer, in feature-table order.
    pub assignments:    Vec<ClusterAssignment>,
    /// Lower is better.
    pub davies_bouldin: f64,
    pub cluster_sizes:  Vec<usize>,
    /// Centroids in standardized feature space.
    pub centroids:      Vec<Vec<f64>>,
    pub inertia:        f64,
}

impl SegmentationOutcome {
    pub fn labels(&self) -> Vec<ClusterLabel> {
        self.assignments.iter().map(|a| a.cluster).collect()
    }

    pub fn label_of(&self, customer_id: &str) -> Option<ClusterLabel> {
        self.assignments
            .iter()
            .find(|a| a.customer_id == customer_id)
            .map(|a| a.cluster)
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

pub fn cluster(
    features: &FeatureTable,
    n_clusters: usize,
    config: &SegmentationConfig,
) -> AnalyticsResult<SegmentationOutcome> {
    let population = features.len();
    if population == 0 {
        return Err(AnalyticsError::EmptyPopulation);
    }
    if n_clusters < 2 || n_clusters > population {
        return Err(AnalyticsError::InvalidClusterCount {
            requested: n_clusters,
            population,
        });
    }

    let (scaled, _) = standardize(&features.schema, &features.rows)?;
    let records = scaled.values;

    let distinct = distinct_rows(&records);
    if distinct < n_clusters {
        // Coincident rows always share a cluster.
        return Err(AnalyticsError::DegenerateCluster { cluster: distinct });
    }

    let rng = RngBank::new(config.seed).for_stream(StreamSlot::ClusterInit);
    log::debug!(
        "kmeans[{}]: {population} rows, {distinct} distinct, n_init={}",
        rng.name,
        config.n_init
    );

    let targets: Array1<usize> = Array1::zeros(population);
    let dataset = Dataset::new(records, targets);
    let model = KMeans::params_with(n_clusters, rng, L2Dist)
        .n_runs(config.n_init)
        .max_n_iterations(config.max_iterations as u64)
        .tolerance(config.tolerance)
        .init_method(KMeansInit::KMeansPlusPlus)
        .fit(&dataset)?;

    let predicted: Array1<usize> = model.predict(&dataset);
    let labels = predicted.to_vec();
    let records = dataset.records();
    let centroids = model.centroids();

    let mut cluster_sizes = vec![0; n_clusters];
    let mut inertia = 0.0;
    for (row, &label) in records.outer_iter().zip(&labels) {
        cluster_sizes[label] += 1;
        inertia += squared_distance(row, centroids.row(label));
    }

    let davies_bouldin = davies_bouldin(records, &labels, n_clusters)?;

    log::info!(
        "segmentation: {population} customers into {n_clusters} clusters, \
         davies_bouldin={davies_bouldin:.4} inertia={inertia:.4}"
    );

    let assignments = features
        .customer_ids
        .iter()
        .zip(&labels)
        .map(|(id, &cluster)| ClusterAssignment {
            customer_id: id.clone(),
            cluster,
        })
        .collect();

    Ok(SegmentationOutcome {
        schema: scaled.schema,
        n_clusters,
        assignments,
        davies_bouldin,
        cluster_sizes,
        centroids: centroids.outer_iter().map(|c| c.to_vec()).collect(),
        inertia,
    })
}

/// Number of distinct rows, comparing values exactly.
fn distinct_rows(records: &Array2<f64>) -> usize {
    records
        .outer_iter()
        .map(|row| {
            row.iter()
                .map(|&x| if x == 0.0 { 0 } else { x.to_bits() })
                .collect::<Vec<u64>>()
        })
        .collect::<HashSet<_>>()
        .len()
}

/// Member means per cluster; `None` for a cluster with no members.
fn cluster_means(records: &Array2<f64>, labels: &[ClusterLabel], k: usize) -> Vec<Option<Array1<f64>>> {
    let mut sums = Array2::<f64>::zeros((k, records.ncols()));
    let mut counts = vec![0usize; k];
    for (row, &label) in records.outer_iter().zip(labels) {
        let mut sum = sums.row_mut(label);
        sum += &row;
        counts[label] += 1;
    }
    sums.outer_iter()
        .zip(counts)
        .map(|(sum, count)| (count > 0).then(|| &sum / count as f64))
        .collect()
}

// ── Quality score ────────────────────────────────────────────────────────────

/// Davies–Bouldin index of a labelled matrix.
///
/// For each cluster i: max over j != i of (s_i + s_j) / d(c_i, c_j), where
/// s is the mean member-to-centroid distance. The index is the mean of those
/// maxima. Coincident centroids contribute 0. An empty cluster is an error.
pub fn davies_bouldin(
    records: &Array2<f64>,
    labels: &[ClusterLabel],
    n_clusters: usize,
) -> AnalyticsResult<f64> {
    if records.nrows() == 0 {
        return Err(AnalyticsError::EmptyPopulation);
    }
    if n_clusters < 2 {
        return Err(AnalyticsError::InvalidClusterCount {
            requested: n_clusters,
            population: records.nrows(),
        });
    }
    if labels.len() != records.nrows() {
        return Err(AnalyticsError::SchemaMismatch {
            expected: records.nrows(),
            actual: labels.len(),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&l| l >= n_clusters) {
        return Err(anyhow::anyhow!("label {bad} outside [0, {n_clusters})").into());
    }

    let mut centroids = Vec::with_capacity(n_clusters);
    for (cluster, mean) in cluster_means(records, labels, n_clusters).into_iter().enumerate() {
        match mean {
            Some(c) => centroids.push(c),
            None => return Err(AnalyticsError::DegenerateCluster { cluster }),
        }
    }

    let mut scatter = vec![0.0; n_clusters];
    let mut counts = vec![0usize; n_clusters];
    for (row, &label) in records.outer_iter().zip(labels) {
        scatter[label] += squared_distance(row, centroids[label].view()).sqrt();
        counts[label] += 1;
    }
    for (s, &c) in scatter.iter_mut().zip(&counts) {
        *s /= c as f64;
    }

    let mut total = 0.0;
    for i in 0..n_clusters {
        let mut worst: f64 = 0.0;
        for j in 0..n_clusters {
            if i == j {
                continue;
            }
            let separation = squared_distance(centroids[i].view(), centroids[j].view()).sqrt();
            if separation > 0.0 {
                worst = worst.max((scatter[i] + scatter[j]) / separation);
            }
        }
        total += worst;
    }
    Ok(total / n_clusters as f64)
}

fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}
