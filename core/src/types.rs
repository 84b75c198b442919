//! Shared primitive types used across the entire pipeline.

use chrono::{DateTime, Utc};

/// A stable, unique customer identifier.
pub type CustomerId = String;

/// A stable, unique product identifier.
pub type ProductId = String;

/// A cluster label in `[0, n_clusters)`.
pub type ClusterLabel = usize;

/// All timestamps are normalized to UTC before they reach the core.
pub type Timestamp = DateTime<Utc>;
