//! Crane Types - Core types for recommendation reconciliation
//!
//! A `Recommendation` is a declarative request for a resource sizing or
//! horizontal-scaling recommendation. The controller owns its status, which
//! carries the computed payloads and a small ledger of conditions that
//! downstream consumers poll.
//!
//! ## Key Concepts
//!
//! - **ObjectKey / ObjectMeta**: Namespaced identity, version and deletion marker
//! - **RecommendationSpec**: What to recommend for, opaque to the controller
//! - **RecommendationStatus**: Computed payloads, conditions and timestamps
//! - **Conditions**: Type-keyed condition ledger with upsert semantics
//! - **ProposedRecommendation**: What a recommender offers on a single pass

#![deny(unsafe_code)]
#![cfg_attr(feature = "strict-docs", warn(missing_docs))]
#![cfg_attr(not(feature = "strict-docs"), allow(missing_docs))]

pub mod conditions;
pub mod meta;
pub mod recommendation;

pub use conditions::{Condition, ConditionStatus, Conditions};
pub use meta::{KeyParseError, ObjectKey, ObjectMeta};
pub use recommendation::{
    AlgorithmType, ContainerRecommendation, EffectiveHpaRecommendation, HpaMetricTarget,
    ProposedRecommendation, Recommendation, RecommendationSpec, RecommendationStatus,
    RecommendationType, ResourceRequestRecommendation, TargetRef,
};

/// Condition type summarizing overall reconciliation health
pub const CONDITION_READY: &str = "Ready";

/// Ready reason recorded when the recommender could not be constructed
pub const REASON_FAILED_CREATE_RECOMMENDER: &str = "FailedCreateRecommender";

/// Ready reason recorded when the recommender failed to offer a result
pub const REASON_FAILED_OFFER_RECOMMEND: &str = "FailedOfferRecommend";

/// Ready reason recorded when a recommendation was computed
pub const REASON_RECOMMENDATION_READY: &str = "RecommendationReady";
