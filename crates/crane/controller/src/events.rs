//! Diagnostic events attached to recommendations
//!
//! Events are fire-and-forget: recording never blocks and never fails the
//! caller. The broadcast recorder fans them out to any number of subscribers.

use crate::config::EventConfig;
use crane_types::{ObjectKey, Recommendation};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::debug;
use uuid::Uuid;

/// Event reason emitted when the recommender could not be built
pub const EVENT_FAILED_CREATE_RECOMMENDER: &str = "FailedCreateRecommender";

/// Event reason emitted when the recommender failed to offer a result
pub const EVENT_FAILED_OFFER_RECOMMENDATION: &str = "FailedOfferRecommendation";

/// Event reason emitted when the status write was rejected
pub const EVENT_FAILED_UPDATE_STATUS: &str = "FailedUpdateStatus";

/// Event type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Normal,
    Warning,
}

/// A diagnostic event about one recommendation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationEvent {
    /// Unique event ID
    pub id: Uuid,

    /// Event timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,

    /// Object the event is about
    pub involved_object: ObjectKey,

    /// UID of the object at the time of the event
    pub involved_uid: Uuid,

    pub event_type: EventType,

    /// Machine-readable reason
    pub reason: String,

    /// Human-readable detail
    pub message: String,
}

/// Sink for diagnostic events
pub trait EventRecorder: Send + Sync {
    fn event(
        &self,
        recommendation: &Recommendation,
        event_type: EventType,
        reason: &str,
        message: &str,
    );
}

/// Publishes events on a broadcast channel
pub struct BroadcastEventRecorder {
    event_tx: broadcast::Sender<RecommendationEvent>,
}

impl BroadcastEventRecorder {
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity.max(1));
        Self { event_tx }
    }

    /// Create a recorder sized by the `events` configuration section
    pub fn from_config(config: &EventConfig) -> Self {
        Self::new(config.channel_capacity)
    }

    /// Subscribe to the event stream
    pub fn subscribe(&self) -> broadcast::Receiver<RecommendationEvent> {
        self.event_tx.subscribe()
    }
}

impl Default for BroadcastEventRecorder {
    fn default() -> Self {
        Self::from_config(&EventConfig::default())
    }
}

impl EventRecorder for BroadcastEventRecorder {
    fn event(
        &self,
        recommendation: &Recommendation,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let event = RecommendationEvent {
            id: Uuid::new_v4(),
            timestamp: chrono::Utc::now(),
            involved_object: recommendation.key(),
            involved_uid: recommendation.metadata.uid,
            event_type,
            reason: reason.to_string(),
            message: message.to_string(),
        };

        debug!(
            recommendation = %event.involved_object,
            reason = %event.reason,
            "Recording event"
        );

        // No subscribers is fine
        let _ = self.event_tx.send(event);
    }
}
