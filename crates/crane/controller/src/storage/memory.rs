//! In-memory storage implementation

use super::traits::RecommendationStore;
use crate::error::{StoreError, StoreResult};
use async_trait::async_trait;
use crane_types::{ObjectKey, Recommendation};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::RwLock;

/// In-memory storage for development and testing
#[derive(Debug)]
pub struct InMemoryStore {
    recommendations: Arc<RwLock<HashMap<ObjectKey, Recommendation>>>,
    update_count: Arc<AtomicU64>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            recommendations: Arc::new(RwLock::new(HashMap::new())),
            update_count: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Create or replace a recommendation, bypassing version checks
    pub async fn insert(&self, mut recommendation: Recommendation) -> Recommendation {
        let mut recommendations = self.recommendations.write().await;
        let key = recommendation.key();
        let current = recommendations
            .get(&key)
            .map(|r| r.metadata.resource_version)
            .unwrap_or(0);
        recommendation.metadata.resource_version = current + 1;
        recommendations.insert(key, recommendation.clone());
        recommendation
    }

    /// Set the deletion marker on a stored recommendation
    pub async fn mark_deleted(&self, key: &ObjectKey) -> StoreResult<()> {
        let mut recommendations = self.recommendations.write().await;
        let stored = recommendations
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;
        if stored.metadata.deletion_timestamp.is_none() {
            stored.metadata.deletion_timestamp = Some(chrono::Utc::now());
            stored.metadata.resource_version += 1;
        }
        Ok(())
    }

    /// Remove a recommendation
    pub async fn remove(&self, key: &ObjectKey) -> bool {
        let mut recommendations = self.recommendations.write().await;
        recommendations.remove(key).is_some()
    }

    /// List all recommendations
    pub async fn list(&self) -> Vec<Recommendation> {
        let recommendations = self.recommendations.read().await;
        recommendations.values().cloned().collect()
    }

    /// Number of successful `update` calls so far
    pub fn update_count(&self) -> u64 {
        self.update_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RecommendationStore for InMemoryStore {
    async fn get(&self, key: &ObjectKey) -> StoreResult<Recommendation> {
        let recommendations = self.recommendations.read().await;
        recommendations
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn update(&self, mut recommendation: Recommendation) -> StoreResult<Recommendation> {
        let mut recommendations = self.recommendations.write().await;
        let key = recommendation.key();
        let stored = recommendations
            .get_mut(&key)
            .ok_or_else(|| StoreError::NotFound(key.clone()))?;

        if stored.metadata.resource_version != recommendation.metadata.resource_version {
            return Err(StoreError::Conflict {
                key,
                expected: recommendation.metadata.resource_version,
                actual: stored.metadata.resource_version,
            });
        }

        recommendation.metadata.resource_version += 1;
        *stored = recommendation.clone();
        self.update_count.fetch_add(1, Ordering::SeqCst);

        Ok(recommendation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crane_types::{
        AlgorithmType, ObjectMeta, RecommendationSpec, RecommendationType, TargetRef,
    };

    fn create_test_recommendation(name: &str) -> Recommendation {
        Recommendation::new(
            ObjectMeta::new("default", name),
            RecommendationSpec {
                target_ref: TargetRef {
                    api_version: "apps/v1".to_string(),
                    kind: "Deployment".to_string(),
                    name: name.to_string(),
                },
                recommendation_type: RecommendationType::Hpa,
                algorithm: AlgorithmType::Dsp,
                parameters: Default::default(),
            },
        )
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .get(&ObjectKey::new("default", "missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_update_bumps_resource_version() {
        let store = InMemoryStore::new();
        let stored = store.insert(create_test_recommendation("web")).await;
        assert_eq!(stored.metadata.resource_version, 1);

        let updated = store.update(stored).await.unwrap();
        assert_eq!(updated.metadata.resource_version, 2);
        assert_eq!(store.update_count(), 1);

        let fetched = store.get(&updated.key()).await.unwrap();
        assert_eq!(fetched.metadata.resource_version, 2);
    }

    #[tokio::test]
    async fn test_stale_update_conflicts() {
        let store = InMemoryStore::new();
        let stored = store.insert(create_test_recommendation("web")).await;

        store.update(stored.clone()).await.unwrap();
        let err = store.update(stored).await.unwrap_err();

        assert!(err.is_conflict());
        assert_eq!(store.update_count(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = InMemoryStore::new();
        let err = store
            .update(create_test_recommendation("ghost"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_mark_deleted_and_remove() {
        let store = InMemoryStore::new();
        let stored = store.insert(create_test_recommendation("web")).await;
        let key = stored.key();

        store.mark_deleted(&key).await.unwrap();
        let fetched = store.get(&key).await.unwrap();
        assert!(fetched.metadata.is_being_deleted());
        assert_eq!(fetched.metadata.resource_version, 2);

        assert!(store.remove(&key).await);
        assert!(store.list().await.is_empty());
        assert!(store.mark_deleted(&key).await.unwrap_err().is_not_found());
    }
}
