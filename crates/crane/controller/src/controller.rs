//! Recommendation controller
//!
//! `reconcile` is the entry point for one pass over one key: fetch, build a
//! recommender for the request, ask it for an offer and hand the outcome to
//! the status reconciler.

use crate::error::ReconcileError;
use crate::events::{
    EventRecorder, EventType, EVENT_FAILED_CREATE_RECOMMENDER, EVENT_FAILED_OFFER_RECOMMENDATION,
};
use crate::recommender::{RecommenderDeps, RecommenderRegistry};
use crate::status::{compute_status, ReadyOutcome, StatusReconciler};
use crate::storage::RecommendationStore;
use crate::teardown::{NoopTeardown, PredictionTeardown};
use crane_types::{ObjectKey, ProposedRecommendation, Recommendation};
use std::sync::Arc;
use tracing::{error, info};

/// Reconciles recommendations against their recommenders
pub struct RecommendationController {
    store: Arc<dyn RecommendationStore>,
    recorder: Arc<dyn EventRecorder>,
    registry: RecommenderRegistry,
    deps: RecommenderDeps,
    status: StatusReconciler,
    teardown: Arc<dyn PredictionTeardown>,
}

impl RecommendationController {
    /// Create a controller. `deps.store` is what recommenders see; status is
    /// always written through `store`.
    pub fn new(
        store: Arc<dyn RecommendationStore>,
        recorder: Arc<dyn EventRecorder>,
        registry: RecommenderRegistry,
        deps: RecommenderDeps,
    ) -> Self {
        Self {
            status: StatusReconciler::new(store.clone(), recorder.clone()),
            store,
            recorder,
            registry,
            deps,
            teardown: Arc::new(NoopTeardown),
        }
    }

    /// Replace the teardown hook used for deleted recommendations
    pub fn with_teardown(mut self, teardown: Arc<dyn PredictionTeardown>) -> Self {
        self.teardown = teardown;
        self
    }

    /// Run one reconciliation pass for `key`.
    ///
    /// A successful pass waits for the next event; retry policy after an
    /// error belongs to the caller.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<(), ReconcileError> {
        info!(recommendation = %key, "got");

        let mut recommendation = self.store.get(key).await?;

        if recommendation.metadata.is_being_deleted() {
            self.teardown.stop_prediction(&recommendation).await;
            return Ok(());
        }

        let recommender = match self.registry.new_recommender(&self.deps, &recommendation) {
            Ok(recommender) => recommender,
            Err(e) => {
                self.recorder.event(
                    &recommendation,
                    EventType::Normal,
                    EVENT_FAILED_CREATE_RECOMMENDER,
                    &e.to_string(),
                );
                error!(recommendation = %key, error = %e, "Failed to create recommender");
                self.commit(
                    &mut recommendation,
                    None,
                    ReadyOutcome::CreateFailed(e.to_string()),
                )
                .await;
                return Err(ReconcileError::CreateRecommender {
                    key: key.clone(),
                    source: e,
                });
            }
        };

        let proposed = match recommender.offer().await {
            Ok(proposed) => proposed,
            Err(e) => {
                self.recorder.event(
                    &recommendation,
                    EventType::Normal,
                    EVENT_FAILED_OFFER_RECOMMENDATION,
                    &e.to_string(),
                );
                error!(recommendation = %key, error = %e, "Failed to offer recommend");
                self.commit(
                    &mut recommendation,
                    None,
                    ReadyOutcome::OfferFailed(e.to_string()),
                )
                .await;
                return Err(ReconcileError::OfferRecommendation {
                    key: key.clone(),
                    source: e,
                });
            }
        };

        self.commit(&mut recommendation, proposed.as_ref(), ReadyOutcome::Ready)
            .await;

        Ok(())
    }

    // A rejected status write is reported by the status reconciler and does
    // not fail the pass.
    async fn commit(
        &self,
        recommendation: &mut Recommendation,
        proposed: Option<&ProposedRecommendation>,
        outcome: ReadyOutcome,
    ) {
        let new_status = compute_status(&recommendation.status, proposed, &outcome);
        self.status.update_status(recommendation, new_status).await;
    }
}
