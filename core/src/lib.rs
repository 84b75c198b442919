//! Customer feature engineering, lookalike ranking and k-means segmentation.

pub mod cluster_engine;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod feature_builder;
pub mod projection;
pub mod recommendation;
pub mod rng;
pub mod similarity;
pub mod standardizer;
pub mod summary;
pub mod table;
pub mod types;
