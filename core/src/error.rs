use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Table '{table}' is missing required column '{column}'")]
    MissingColumn { table: String, column: String },

    #[error("Table '{table}' row {row}: invalid value in column '{column}'")]
    InvalidValue { table: String, column: String, row: usize },

    #[error("Customer '{customer_id}' not found")]
    UnknownCustomer { customer_id: String },

    #[error("Invalid cluster count {requested}: must be between 2 and {population}")]
    InvalidClusterCount { requested: usize, population: usize },

    #[error("Cluster count {requested} is outside the configured range {min}..={max}")]
    ClusterCountOutOfRange { requested: usize, min: usize, max: usize },

    #[error("Invalid neighbor count {k}: must be at least 1")]
    InvalidNeighborCount { k: usize },

    #[error("Cluster {cluster} has no members; quality score is undefined")]
    DegenerateCluster { cluster: usize },

    #[error("No customers supplied")]
    EmptyPopulation,

    #[error("Customer '{customer_id}' appears more than once in the customer table")]
    DuplicateCustomer { customer_id: String },

    #[error("Schema mismatch: expected {expected} columns, got {actual}")]
    SchemaMismatch { expected: usize, actual: usize },

    #[error("k-means failed: {0}")]
    Clustering(#[from] linfa_clustering::KMeansError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
