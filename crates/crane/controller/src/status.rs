//! Status reconciliation
//!
//! A pass computes a new status snapshot from the recommender's outcome and
//! commits it only when it differs from what is persisted. At most one store
//! write happens per pass, and a failed write is reported through events and
//! logs without failing the pass.

use crate::events::{EventRecorder, EventType, EVENT_FAILED_UPDATE_STATUS};
use crate::error::StoreError;
use crate::storage::RecommendationStore;
use crane_types::{
    ConditionStatus, ProposedRecommendation, Recommendation, RecommendationStatus,
    CONDITION_READY, REASON_FAILED_CREATE_RECOMMENDER, REASON_FAILED_OFFER_RECOMMEND,
    REASON_RECOMMENDATION_READY,
};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Message recorded on the Ready condition after a successful pass
pub const MESSAGE_RECOMMENDATION_READY: &str = "Recommendation is ready";

/// How the recommender part of a pass ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadyOutcome {
    /// The recommender could not be built
    CreateFailed(String),
    /// The recommender ran and failed
    OfferFailed(String),
    /// The recommender produced an offer, possibly empty
    Ready,
}

impl ReadyOutcome {
    fn condition(&self) -> (ConditionStatus, &'static str, &str) {
        match self {
            ReadyOutcome::CreateFailed(detail) => (
                ConditionStatus::False,
                REASON_FAILED_CREATE_RECOMMENDER,
                detail.as_str(),
            ),
            ReadyOutcome::OfferFailed(detail) => (
                ConditionStatus::False,
                REASON_FAILED_OFFER_RECOMMEND,
                detail.as_str(),
            ),
            ReadyOutcome::Ready => (
                ConditionStatus::True,
                REASON_RECOMMENDATION_READY,
                MESSAGE_RECOMMENDATION_READY,
            ),
        }
    }
}

/// Result of [`StatusReconciler::update_status`]
#[derive(Debug)]
pub enum StatusUpdate {
    /// Nothing changed, no write was made
    Unchanged,
    /// The new status was written
    Committed,
    /// The write was attempted and rejected
    Failed(StoreError),
}

impl StatusUpdate {
    pub fn is_committed(&self) -> bool {
        matches!(self, StatusUpdate::Committed)
    }
}

/// Build the status a pass wants to persist.
///
/// Payloads present in `proposed` overwrite the recorded ones; absent payloads
/// are kept. The Ready condition is always upserted.
pub fn compute_status(
    current: &RecommendationStatus,
    proposed: Option<&ProposedRecommendation>,
    outcome: &ReadyOutcome,
) -> RecommendationStatus {
    let mut new_status = current.clone();

    if let Some(proposed) = proposed {
        new_status.merge_proposed(proposed);
    }

    let (status, reason, message) = outcome.condition();
    new_status
        .conditions
        .upsert(CONDITION_READY, status, reason, message);

    new_status
}

fn is_successful(status: &RecommendationStatus) -> bool {
    status
        .conditions
        .get(CONDITION_READY)
        .is_some_and(|c| c.reason == REASON_RECOMMENDATION_READY)
        && status.has_payload()
}

/// Diffs and commits recommendation status
pub struct StatusReconciler {
    store: Arc<dyn RecommendationStore>,
    recorder: Arc<dyn EventRecorder>,
}

impl StatusReconciler {
    pub fn new(store: Arc<dyn RecommendationStore>, recorder: Arc<dyn EventRecorder>) -> Self {
        Self { store, recorder }
    }

    /// Commit `new_status` into `recommendation` if it differs from the
    /// current status.
    ///
    /// On a rejected write the in-memory object keeps the attempted status;
    /// the next pass starts from a fresh fetch and retries the same diff.
    pub async fn update_status(
        &self,
        recommendation: &mut Recommendation,
        new_status: RecommendationStatus,
    ) -> StatusUpdate {
        if recommendation.status.same_state(&new_status) {
            return StatusUpdate::Unchanged;
        }

        let key = recommendation.key();
        debug!(
            recommendation = %key,
            current_status = ?recommendation.status,
            new_status = ?new_status,
            "Recommendation status should be updated"
        );

        let now = chrono::Utc::now();
        recommendation.status = new_status;
        recommendation.status.last_update_time = Some(now);
        if is_successful(&recommendation.status) {
            recommendation.status.last_successful_time = Some(now);
        }

        match self.store.update(recommendation.clone()).await {
            Ok(stored) => {
                recommendation.metadata = stored.metadata;
                info!(recommendation = %key, "Update Recommendation status successful");
                StatusUpdate::Committed
            }
            Err(e) => {
                self.recorder.event(
                    recommendation,
                    EventType::Normal,
                    EVENT_FAILED_UPDATE_STATUS,
                    &e.to_string(),
                );
                error!(recommendation = %key, error = %e, "Failed to update status");
                StatusUpdate::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::BroadcastEventRecorder;
    use crate::storage::InMemoryStore;
    use crane_types::{
        AlgorithmType, EffectiveHpaRecommendation, ObjectMeta, RecommendationSpec,
        RecommendationType, ResourceRequestRecommendation, TargetRef,
    };

    fn create_test_recommendation() -> Recommendation {
        Recommendation::new(
            ObjectMeta::new("default", "web"),
            RecommendationSpec {
                target_ref: TargetRef {
                    api_version: "apps/v1".to_string(),
                    kind: "Deployment".to_string(),
                    name: "web".to_string(),
                },
                recommendation_type: RecommendationType::Resource,
                algorithm: AlgorithmType::Percentile,
                parameters: Default::default(),
            },
        )
    }

    fn hpa() -> EffectiveHpaRecommendation {
        EffectiveHpaRecommendation {
            min_replicas: Some(2),
            max_replicas: 10,
            metrics: vec![],
        }
    }

    #[test]
    fn test_compute_status_state_table() {
        let current = RecommendationStatus::default();

        let created = compute_status(&current, None, &ReadyOutcome::CreateFailed("bad ref".into()));
        let ready = created.conditions.get(CONDITION_READY).unwrap();
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, REASON_FAILED_CREATE_RECOMMENDER);
        assert_eq!(ready.message, "bad ref");

        let offered = compute_status(&created, None, &ReadyOutcome::OfferFailed("no data".into()));
        let ready = offered.conditions.get(CONDITION_READY).unwrap();
        assert_eq!(ready.status, ConditionStatus::False);
        assert_eq!(ready.reason, REASON_FAILED_OFFER_RECOMMEND);
        assert_eq!(offered.conditions.len(), 1);

        let ok = compute_status(&offered, None, &ReadyOutcome::Ready);
        let ready = ok.conditions.get(CONDITION_READY).unwrap();
        assert_eq!(ready.status, ConditionStatus::True);
        assert_eq!(ready.reason, REASON_RECOMMENDATION_READY);
        assert_eq!(ready.message, MESSAGE_RECOMMENDATION_READY);
    }

    #[test]
    fn test_compute_status_does_not_touch_timestamps() {
        let current = RecommendationStatus {
            last_update_time: Some(chrono::Utc::now()),
            ..Default::default()
        };
        let proposed = ProposedRecommendation {
            resource_request: Some(ResourceRequestRecommendation::default()),
            effective_hpa: None,
        };

        let new_status = compute_status(&current, Some(&proposed), &ReadyOutcome::Ready);
        assert_eq!(new_status.last_update_time, current.last_update_time);
        assert_eq!(new_status.last_successful_time, None);
        assert!(new_status.resource_request.is_some());
    }

    #[tokio::test]
    async fn test_update_status_commits_and_stamps_success() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = Arc::new(BroadcastEventRecorder::default());
        let reconciler = StatusReconciler::new(store.clone(), recorder);

        let mut recommendation = store.insert(create_test_recommendation()).await;
        let proposed = ProposedRecommendation {
            resource_request: None,
            effective_hpa: Some(hpa()),
        };
        let new_status =
            compute_status(&recommendation.status, Some(&proposed), &ReadyOutcome::Ready);

        let update = reconciler.update_status(&mut recommendation, new_status).await;
        assert!(update.is_committed());
        assert_eq!(store.update_count(), 1);

        let status = &recommendation.status;
        assert!(status.last_update_time.is_some());
        assert_eq!(status.last_successful_time, status.last_update_time);
        assert_eq!(recommendation.metadata.resource_version, 2);

        let stored = store.get(&recommendation.key()).await.unwrap();
        assert_eq!(stored.status, recommendation.status);
    }

    #[tokio::test]
    async fn test_ready_without_payload_is_not_successful() {
        let store = Arc::new(InMemoryStore::new());
        let reconciler =
            StatusReconciler::new(store.clone(), Arc::new(BroadcastEventRecorder::default()));

        let mut recommendation = store.insert(create_test_recommendation()).await;
        let new_status = compute_status(&recommendation.status, None, &ReadyOutcome::Ready);

        assert!(reconciler
            .update_status(&mut recommendation, new_status)
            .await
            .is_committed());
        assert!(recommendation.status.last_update_time.is_some());
        assert!(recommendation.status.last_successful_time.is_none());
    }

    #[tokio::test]
    async fn test_unchanged_status_is_not_written() {
        let store = Arc::new(InMemoryStore::new());
        let reconciler =
            StatusReconciler::new(store.clone(), Arc::new(BroadcastEventRecorder::default()));

        let mut recommendation = store.insert(create_test_recommendation()).await;
        let first = compute_status(&recommendation.status, None, &ReadyOutcome::Ready);
        reconciler.update_status(&mut recommendation, first).await;
        let committed = recommendation.status.clone();

        // Only the Ready transition time moves on the second pass.
        let second = compute_status(&recommendation.status, None, &ReadyOutcome::Ready);
        let update = reconciler.update_status(&mut recommendation, second).await;

        assert!(matches!(update, StatusUpdate::Unchanged));
        assert_eq!(store.update_count(), 1);
        assert_eq!(recommendation.status, committed);
    }

    #[tokio::test]
    async fn test_failed_write_is_reported_not_raised() {
        let store = Arc::new(InMemoryStore::new());
        let recorder = Arc::new(BroadcastEventRecorder::default());
        let mut events = recorder.subscribe();
        let reconciler = StatusReconciler::new(store.clone(), recorder);

        let mut recommendation = store.insert(create_test_recommendation()).await;
        // Someone else writes first; our copy is now stale.
        store.insert(recommendation.clone()).await;

        let new_status = compute_status(
            &recommendation.status,
            None,
            &ReadyOutcome::OfferFailed("boom".into()),
        );
        let update = reconciler
            .update_status(&mut recommendation, new_status)
            .await;

        assert!(matches!(update, StatusUpdate::Failed(ref e) if e.is_conflict()));
        assert_eq!(store.update_count(), 0);

        // The attempted snapshot stays on the in-memory object.
        let ready = recommendation.status.conditions.get(CONDITION_READY).unwrap();
        assert_eq!(ready.reason, REASON_FAILED_OFFER_RECOMMEND);
        assert!(recommendation.status.last_update_time.is_some());

        let event = events.recv().await.unwrap();
        assert_eq!(event.reason, EVENT_FAILED_UPDATE_STATUS);
        assert_eq!(event.event_type, EventType::Normal);
    }
}
