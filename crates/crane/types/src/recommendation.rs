//! Recommendation request and status types
//!
//! The spec is consumed by recommenders only. The status is owned by the
//! controller; the payloads inside it are opaque, only their presence matters
//! to reconciliation.

use crate::conditions::Conditions;
use crate::meta::{ObjectKey, ObjectMeta};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A declarative request for a recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub metadata: ObjectMeta,

    pub spec: RecommendationSpec,

    #[serde(default)]
    pub status: RecommendationStatus,
}

impl Recommendation {
    pub fn new(metadata: ObjectMeta, spec: RecommendationSpec) -> Self {
        Self {
            metadata,
            spec,
            status: RecommendationStatus::default(),
        }
    }

    pub fn key(&self) -> ObjectKey {
        self.metadata.key()
    }
}

/// Reference to the workload a recommendation is computed for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    pub api_version: String,
    pub kind: String,
    pub name: String,
}

/// Kind of recommendation requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecommendationType {
    /// Container resource requests
    Resource,
    /// Horizontal scaling policy
    #[serde(rename = "HPA")]
    Hpa,
}

/// Prediction algorithm a recommender is built around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmType {
    Percentile,
    Dsp,
}

impl fmt::Display for AlgorithmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmType::Percentile => f.write_str("percentile"),
            AlgorithmType::Dsp => f.write_str("dsp"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationSpec {
    pub target_ref: TargetRef,

    #[serde(rename = "type")]
    pub recommendation_type: RecommendationType,

    pub algorithm: AlgorithmType,

    /// Algorithm-specific knobs, passed through untouched
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, String>,
}

/// Recommended requests for a single container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecommendation {
    pub container_name: String,

    /// Resource name to quantity, e.g. `cpu: 250m`
    pub target: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRequestRecommendation {
    pub containers: Vec<ContainerRecommendation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HpaMetricTarget {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_average_utilization: Option<i32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_average_value: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectiveHpaRecommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replicas: Option<i32>,

    pub max_replicas: i32,

    #[serde(default)]
    pub metrics: Vec<HpaMetricTarget>,
}

/// Result offered by a recommender for one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposedRecommendation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_request: Option<ResourceRequestRecommendation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_hpa: Option<EffectiveHpaRecommendation>,
}

/// Observed state of a recommendation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_request: Option<ResourceRequestRecommendation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_hpa: Option<EffectiveHpaRecommendation>,

    #[serde(default)]
    pub conditions: Conditions,

    /// Time of the most recent committed status change
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update_time: Option<DateTime<Utc>>,

    /// Time of the most recent change that was ready and carried a payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_successful_time: Option<DateTime<Utc>>,
}

impl RecommendationStatus {
    pub fn has_payload(&self) -> bool {
        self.resource_request.is_some() || self.effective_hpa.is_some()
    }

    /// Copy the payloads present in `proposed`; absent ones are kept
    pub fn merge_proposed(&mut self, proposed: &ProposedRecommendation) {
        if let Some(resource_request) = &proposed.resource_request {
            self.resource_request = Some(resource_request.clone());
        }
        if let Some(effective_hpa) = &proposed.effective_hpa {
            self.effective_hpa = Some(effective_hpa.clone());
        }
    }

    /// Structural comparison where a refreshed condition transition time
    /// alone does not count as a change
    pub fn same_state(&self, other: &RecommendationStatus) -> bool {
        self.resource_request == other.resource_request
            && self.effective_hpa == other.effective_hpa
            && self.last_update_time == other.last_update_time
            && self.last_successful_time == other.last_successful_time
            && self.conditions.same_state(&other.conditions)
    }
}
