//! Hook for recommendations that are being deleted

use async_trait::async_trait;
use crane_types::Recommendation;
use tracing::debug;

/// Called once per pass for a recommendation carrying a deletion marker.
///
/// Implementations stop whatever prediction work was started on behalf of
/// the recommendation. The pass succeeds regardless.
#[async_trait]
pub trait PredictionTeardown: Send + Sync {
    async fn stop_prediction(&self, recommendation: &Recommendation);
}

/// Teardown that only records that it was asked
#[derive(Debug, Clone, Default)]
pub struct NoopTeardown;

#[async_trait]
impl PredictionTeardown for NoopTeardown {
    async fn stop_prediction(&self, recommendation: &Recommendation) {
        debug!(
            recommendation = %recommendation.key(),
            "Recommendation is being deleted, no prediction teardown configured"
        );
    }
}
