//! Error types for crane-controller

use crane_types::{AlgorithmType, ObjectKey};
use thiserror::Error;

/// Wiring-level errors
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Tracing subscriber could not be installed
    #[error("Telemetry error: {0}")]
    Telemetry(String),
}

impl From<config::ConfigError> for ControllerError {
    fn from(e: config::ConfigError) -> Self {
        ControllerError::Config(e.to_string())
    }
}

/// Store-specific errors
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Object does not exist
    #[error("Not found: {0}")]
    NotFound(ObjectKey),

    /// Object changed since it was read
    #[error("Conflict on {key}: expected resource version {expected}, found {actual}")]
    Conflict {
        key: ObjectKey,
        expected: u64,
        actual: u64,
    },

    /// Transient backend failure
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict { .. })
    }
}

/// Errors raised by recommender construction or computation
#[derive(Debug, Clone, Error)]
pub enum RecommenderError {
    #[error("No recommender registered for algorithm {0}")]
    UnsupportedAlgorithm(AlgorithmType),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Missing prerequisite: {0}")]
    MissingPrerequisite(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Errors returned from a reconciliation pass
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The object could not be fetched
    #[error("Failed to fetch recommendation: {0}")]
    Fetch(#[from] StoreError),

    /// The recommender could not be built
    #[error("Failed to create recommender for {key}: {source}")]
    CreateRecommender {
        key: ObjectKey,
        #[source]
        source: RecommenderError,
    },

    /// The recommender ran but produced no result
    #[error("Failed to offer recommendation for {key}: {source}")]
    OfferRecommendation {
        key: ObjectKey,
        #[source]
        source: RecommenderError,
    },
}

impl ReconcileError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ReconcileError::Fetch(e) if e.is_not_found())
    }

    /// Underlying recommender error, if this pass failed inside the recommender
    pub fn recommender_error(&self) -> Option<&RecommenderError> {
        match self {
            ReconcileError::CreateRecommender { source, .. }
            | ReconcileError::OfferRecommendation { source, .. } => Some(source),
            ReconcileError::Fetch(_) => None,
        }
    }
}

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type alias for wiring operations
pub type ControllerResult<T> = Result<T, ControllerError>;
