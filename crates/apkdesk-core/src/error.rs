//! Error types for the analysis cache and history layer

use thiserror::Error;

/// Main error type for session, history and persistence operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The external engine rejected or could not process the input
    #[error("Analysis failed: {0}")]
    AnalysisFailure(String),

    /// History lookup on an identifier that is not in the ledger
    #[error("History entry not found: {0}")]
    NotFound(String),

    /// Storage read or write fault
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A newer request replaced this one while it was in flight
    #[error("Analysis request {0} was superseded by a newer request")]
    Superseded(u64),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl StoreError {
    /// Whether this error came from the storage layer rather than the operation itself
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            StoreError::Persistence(_) | StoreError::Io(_) | StoreError::Serialization(_)
        )
    }
}

/// Result type alias for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
