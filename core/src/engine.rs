//! The analytics engine — one handle over a dataset and its config.
//!
//! PIPELINE (fixed, documented, never reordered):
//!   1. Feature Builder    raw tables -> feature table
//!   2. Standardizer       fresh fit inside each consumer below
//!   3. Similarity Ranker  lookalikes, recommendations
//!   4. Cluster Engine     segmentation (+ optional 2-D projection)
//!
//! RULES:
//!   - Every request rebuilds features from the dataset.
//!   - No fitted scaler, model or feature table is cached between requests.
//!   - All randomness flows through the RngBank seeded from the config.

use crate::{
    cluster_engine::{self, SegmentationOutcome},
    config::PipelineConfig,
    dataset::{Dataset, ProductRecord},
    error::AnalyticsResult,
    feature_builder::{self, FeatureTable},
    projection::{self, Projection},
    recommendation,
    rng::{RngBank, StreamSlot},
    similarity::{self, Neighbor},
    standardizer,
    summary::{self, DatasetSummary},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationView {
    pub outcome:    SegmentationOutcome,
    pub projection: Projection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendations {
    pub customer_id: String,
    pub lookalikes:  Vec<Neighbor>,
    pub products:    Vec<ProductRecord>,
}

pub struct AnalyticsEngine {
    pub dataset: Dataset,
    pub config:  PipelineConfig,
}

impl AnalyticsEngine {
    pub fn new(dataset: Dataset, config: PipelineConfig) -> Self {
        Self { dataset, config }
    }

    /// Engine over a dataset with the test config.
    pub fn build_test(dataset: Dataset) -> Self {
        Self::new(dataset, PipelineConfig::default_test())
    }

    pub fn features(&self) -> AnalyticsResult<FeatureTable> {
        feature_builder::build_features(
            &self.dataset.customers,
            &self.dataset.transactions,
            &self.dataset.products,
        )
    }

    /// Top-k lookalikes. `k` falls back to `config.lookalike.k`.
    pub fn lookalikes(&self, customer_id: &str, k: Option<usize>) -> AnalyticsResult<Vec<Neighbor>> {
        let features = self.features()?;
        let k = k.unwrap_or(self.config.lookalike.k);
        similarity::rank_lookalikes(&features, customer_id, k)
    }

    /// `n_clusters` falls back to `config.segmentation.default_clusters`.
    pub fn segment(&self, n_clusters: Option<usize>) -> AnalyticsResult<SegmentationOutcome> {
        let features = self.features()?;
        let n = n_clusters.unwrap_or(self.config.segmentation.default_clusters);
        cluster_engine::cluster(&features, n, &self.config.segmentation)
    }

    /// Segmentation plus a 2-D projection for display.
    pub fn segment_with_projection(
        &self,
        n_clusters: Option<usize>,
    ) -> AnalyticsResult<SegmentationView> {
        let features = self.features()?;
        let n = n_clusters.unwrap_or(self.config.segmentation.default_clusters);
        let outcome = cluster_engine::cluster(&features, n, &self.config.segmentation)?;

        let (scaled, _) = standardizer::standardize(&features.schema, &features.rows)?;
        let mut rng = RngBank::new(self.config.segmentation.seed).for_stream(StreamSlot::Projection);
        let projection = projection::project_2d(
            &scaled,
            &features.customer_ids,
            &self.config.projection,
            &mut rng,
        )?;

        Ok(SegmentationView { outcome, projection })
    }

    /// Products the customer's lookalikes bought that the customer has not.
    pub fn recommendations(&self, customer_id: &str) -> AnalyticsResult<Recommendations> {
        let lookalikes = self.lookalikes(customer_id, None)?;
        let products = recommendation::recommend_products(&self.dataset, customer_id, &lookalikes)?;
        Ok(Recommendations {
            customer_id: customer_id.to_string(),
            lookalikes,
            products,
        })
    }

    pub fn summary(&self) -> DatasetSummary {
        summary::summarize(&self.dataset)
    }
}
