//! Storage trait definitions

use crate::error::StoreResult;
use async_trait::async_trait;
use crane_types::{ObjectKey, Recommendation};

/// System of record for recommendations
#[async_trait]
pub trait RecommendationStore: Send + Sync {
    /// Get a recommendation by key
    ///
    /// Returns `StoreError::NotFound` when the object does not exist.
    async fn get(&self, key: &ObjectKey) -> StoreResult<Recommendation>;

    /// Write a recommendation back
    ///
    /// The write is optimistic: if the stored resource version differs from
    /// the one carried by `recommendation`, `StoreError::Conflict` is
    /// returned. On success the stored copy, with its new resource version,
    /// is returned.
    async fn update(&self, recommendation: Recommendation) -> StoreResult<Recommendation>;
}
