use crate::error::{AnalyticsError, AnalyticsResult};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookalikeConfig {
    /// Neighbors returned when the caller does not ask for a count.
    pub k: usize,
}

impl Default for LookalikeConfig {
    fn default() -> Self {
        Self { k: crate::similarity::DEFAULT_LOOKALIKES }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub default_clusters: usize,
    /// Bounds offered to interactive callers. The engine itself only
    /// enforces 2 <= n_clusters <= population.
    pub min_clusters:     usize,
    pub max_clusters:     usize,
    /// Seed for k-means++ initialization and the projection start vector.
    pub seed:             u64,
    pub max_iterations:   usize,
    /// Independent k-means runs; the lowest-inertia run is kept.
    pub n_init:           usize,
    /// Stop a run once the centroid set moves less than this.
    pub tolerance:        f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            default_clusters: 5,
            min_clusters:     2,
            max_clusters:     10,
            seed:             42,
            max_iterations:   300,
            n_init:           10,
            tolerance:        1e-4,
        }
    }
}

impl SegmentationConfig {
    /// Resolve an interactive cluster request against
    /// `min_clusters..=max_clusters`; `None` means `default_clusters`.
    pub fn bounded_clusters(&self, requested: Option<usize>) -> AnalyticsResult<usize> {
        let n = requested.unwrap_or(self.default_clusters);
        if !(self.min_clusters..=self.max_clusters).contains(&n) {
            return Err(AnalyticsError::ClusterCountOutOfRange {
                requested: n,
                min: self.min_clusters,
                max: self.max_clusters,
            });
        }
        Ok(n)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectionConfig {
    pub max_iterations: usize,
    pub tolerance:      f64,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance:      1e-10,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub lookalike:    LookalikeConfig,
    pub segmentation: SegmentationConfig,
    pub projection:   ProjectionConfig,
}

impl PipelineConfig {
    /// Load from a JSON file. Absent fields keep their defaults.
    /// In tests, use PipelineConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: PipelineConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let seg = &self.segmentation;
        if self.lookalike.k == 0 {
            anyhow::bail!("lookalike.k must be at least 1");
        }
        if seg.min_clusters < 2 || seg.min_clusters > seg.max_clusters {
            anyhow::bail!(
                "segmentation cluster bounds {}..={} are invalid",
                seg.min_clusters,
                seg.max_clusters
            );
        }
        if !(seg.min_clusters..=seg.max_clusters).contains(&seg.default_clusters) {
            anyhow::bail!(
                "segmentation.default_clusters {} is outside {}..={}",
                seg.default_clusters,
                seg.min_clusters,
                seg.max_clusters
            );
        }
        if seg.n_init == 0 || seg.max_iterations == 0 {
            anyhow::bail!("segmentation.n_init and max_iterations must be at least 1");
        }
        for (name, tolerance) in [
            ("segmentation.tolerance", seg.tolerance),
            ("projection.tolerance", self.projection.tolerance),
        ] {
            if !tolerance.is_finite() || tolerance <= 0.0 {
                anyhow::bail!("{name} must be a positive finite number, got {tolerance}");
            }
        }
        Ok(())
    }

    /// Config with fewer restarts for use in unit tests.
    pub fn default_test() -> Self {
        Self {
            segmentation: SegmentationConfig {
                n_init: 3,
                max_iterations: 100,
                ..SegmentationConfig::default()
            },
            ..Self::default()
        }
    }
}
