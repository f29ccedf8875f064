//! Crane Controller
//!
//! Reconciles `Recommendation` objects against pluggable recommenders:
//! - Recommendation controller (one pass per key)
//! - Status reconciliation with condition ledger and success timestamps
//! - Store, recommender and event-sink seams, plus an in-memory store
//! - Key queue and worker loop with per-key serialization
//! - Configuration loading and tracing setup

pub mod config;
pub mod controller;
pub mod error;
pub mod events;
pub mod recommender;
pub mod scheduler;
pub mod status;
pub mod storage;
pub mod telemetry;
pub mod teardown;

pub use config::ControllerConfig;
pub use controller::RecommendationController;
pub use error::{ControllerError, ReconcileError, RecommenderError, StoreError};
pub use events::{BroadcastEventRecorder, EventRecorder, EventType, RecommendationEvent};
pub use recommender::{
    Recommender, RecommenderDeps, RecommenderFactory, RecommenderRegistry, ResourceMapper,
    ScaleClient,
};
pub use scheduler::ControllerManager;
pub use status::{compute_status, ReadyOutcome, StatusReconciler, StatusUpdate};
pub use storage::{InMemoryStore, RecommendationStore};
pub use teardown::{NoopTeardown, PredictionTeardown};
