//! Recommender capability
//!
//! The controller does not compute recommendations. It looks up a factory by
//! the algorithm a request declares, builds a recommender bound to that
//! request and asks it for an offer. Factories are registered by process
//! wiring and handed to the controller explicitly.

use crate::error::RecommenderError;
use crate::storage::RecommendationStore;
use async_trait::async_trait;
use crane_types::{AlgorithmType, ProposedRecommendation, Recommendation, TargetRef};
use std::collections::HashMap;
use std::sync::Arc;

/// Resolved API resource for a target reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMapping {
    pub group: String,
    pub version: String,
    pub resource: String,
    pub namespaced: bool,
}

/// Maps a target's kind to the API resource serving it
pub trait ResourceMapper: Send + Sync {
    fn mapping_for(&self, target: &TargetRef) -> Result<ResourceMapping, RecommenderError>;
}

/// Scale subresource of a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scale {
    pub replicas: i32,
}

/// Reads the scale subresource of scalable workloads
#[async_trait]
pub trait ScaleClient: Send + Sync {
    async fn get_scale(
        &self,
        namespace: &str,
        mapping: &ResourceMapping,
        name: &str,
    ) -> Result<Scale, RecommenderError>;
}

/// Collaborators a recommender may use while it is built and run
#[derive(Clone)]
pub struct RecommenderDeps {
    pub store: Arc<dyn RecommendationStore>,
    pub resource_mapper: Arc<dyn ResourceMapper>,
    pub scale_client: Arc<dyn ScaleClient>,
}

/// A recommender bound to one request
#[async_trait]
pub trait Recommender: Send + Sync {
    /// Compute a proposal.
    ///
    /// `Ok(None)` means the computation succeeded without a result to record.
    async fn offer(&self) -> Result<Option<ProposedRecommendation>, RecommenderError>;
}

/// Builds recommenders for one algorithm
pub trait RecommenderFactory: Send + Sync {
    fn new_recommender(
        &self,
        deps: &RecommenderDeps,
        recommendation: &Recommendation,
    ) -> Result<Box<dyn Recommender>, RecommenderError>;
}

/// Lookup of recommender factories by algorithm type
#[derive(Clone, Default)]
pub struct RecommenderRegistry {
    factories: HashMap<AlgorithmType, Arc<dyn RecommenderFactory>>,
}

impl RecommenderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any previous one for the algorithm
    pub fn register(&mut self, algorithm: AlgorithmType, factory: Arc<dyn RecommenderFactory>) {
        self.factories.insert(algorithm, factory);
    }

    /// Builder-style variant of [`RecommenderRegistry::register`]
    pub fn with(mut self, algorithm: AlgorithmType, factory: Arc<dyn RecommenderFactory>) -> Self {
        self.register(algorithm, factory);
        self
    }

    pub fn get(&self, algorithm: AlgorithmType) -> Option<Arc<dyn RecommenderFactory>> {
        self.factories.get(&algorithm).cloned()
    }

    pub fn algorithms(&self) -> impl Iterator<Item = &AlgorithmType> {
        self.factories.keys()
    }

    /// Build a recommender for `recommendation` from the factory registered
    /// for its declared algorithm
    pub fn new_recommender(
        &self,
        deps: &RecommenderDeps,
        recommendation: &Recommendation,
    ) -> Result<Box<dyn Recommender>, RecommenderError> {
        let algorithm = recommendation.spec.algorithm;
        let factory = self
            .get(algorithm)
            .ok_or(RecommenderError::UnsupportedAlgorithm(algorithm))?;
        factory.new_recommender(deps, recommendation)
    }
}

/// Mapper for the built-in workload kinds
#[derive(Debug, Clone, Default)]
pub struct StaticResourceMapper;

impl ResourceMapper for StaticResourceMapper {
    fn mapping_for(&self, target: &TargetRef) -> Result<ResourceMapping, RecommenderError> {
        let (group, version) = match target.api_version.split_once('/') {
            Some((group, version)) => (group.to_string(), version.to_string()),
            None => (String::new(), target.api_version.clone()),
        };

        let resource = match target.kind.as_str() {
            "Deployment" => "deployments",
            "StatefulSet" => "statefulsets",
            "ReplicaSet" => "replicasets",
            "DaemonSet" => "daemonsets",
            other => {
                return Err(RecommenderError::InvalidTarget(format!(
                    "unsupported kind {} in {}",
                    other, target.api_version
                )))
            }
        };

        Ok(ResourceMapping {
            group,
            version,
            resource: resource.to_string(),
            namespaced: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use crane_types::{ObjectMeta, RecommendationSpec, RecommendationType};

    struct FixedRecommender;

    #[async_trait]
    impl Recommender for FixedRecommender {
        async fn offer(&self) -> Result<Option<ProposedRecommendation>, RecommenderError> {
            Ok(Some(ProposedRecommendation::default()))
        }
    }

    struct FixedFactory;

    impl RecommenderFactory for FixedFactory {
        fn new_recommender(
            &self,
            deps: &RecommenderDeps,
            recommendation: &Recommendation,
        ) -> Result<Box<dyn Recommender>, RecommenderError> {
            deps.resource_mapper.mapping_for(&recommendation.spec.target_ref)?;
            Ok(Box::new(FixedRecommender))
        }
    }

    struct NoScale;

    #[async_trait]
    impl ScaleClient for NoScale {
        async fn get_scale(
            &self,
            _namespace: &str,
            _mapping: &ResourceMapping,
            name: &str,
        ) -> Result<Scale, RecommenderError> {
            Err(RecommenderError::MissingPrerequisite(format!("no scale for {}", name)))
        }
    }

    fn deps() -> RecommenderDeps {
        RecommenderDeps {
            store: Arc::new(InMemoryStore::new()),
            resource_mapper: Arc::new(StaticResourceMapper),
            scale_client: Arc::new(NoScale),
        }
    }

    fn recommendation(algorithm: AlgorithmType, kind: &str) -> Recommendation {
        Recommendation::new(
            ObjectMeta::new("default", "web"),
            RecommendationSpec {
                target_ref: TargetRef {
                    api_version: "apps/v1".to_string(),
                    kind: kind.to_string(),
                    name: "web".to_string(),
                },
                recommendation_type: RecommendationType::Resource,
                algorithm,
                parameters: Default::default(),
            },
        )
    }

    #[tokio::test]
    async fn test_registry_dispatches_by_algorithm() {
        let registry =
            RecommenderRegistry::new().with(AlgorithmType::Percentile, Arc::new(FixedFactory));

        let recommender = registry
            .new_recommender(&deps(), &recommendation(AlgorithmType::Percentile, "Deployment"))
            .unwrap();
        assert!(recommender.offer().await.unwrap().is_some());
    }

    #[test]
    fn test_registry_rejects_unknown_algorithm() {
        let registry =
            RecommenderRegistry::new().with(AlgorithmType::Percentile, Arc::new(FixedFactory));

        let err = registry
            .new_recommender(&deps(), &recommendation(AlgorithmType::Dsp, "Deployment"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            RecommenderError::UnsupportedAlgorithm(AlgorithmType::Dsp)
        ));
    }

    #[test]
    fn test_factory_errors_pass_through() {
        let registry =
            RecommenderRegistry::new().with(AlgorithmType::Percentile, Arc::new(FixedFactory));

        let err = registry
            .new_recommender(&deps(), &recommendation(AlgorithmType::Percentile, "CronJob"))
            .err()
            .unwrap();
        assert!(matches!(err, RecommenderError::InvalidTarget(_)));
    }

    #[test]
    fn test_static_mapper() {
        let mapping = StaticResourceMapper
            .mapping_for(&TargetRef {
                api_version: "apps/v1".to_string(),
                kind: "StatefulSet".to_string(),
                name: "db".to_string(),
            })
            .unwrap();
        assert_eq!(mapping.group, "apps");
        assert_eq!(mapping.version, "v1");
        assert_eq!(mapping.resource, "statefulsets");

        let core = StaticResourceMapper
            .mapping_for(&TargetRef {
                api_version: "v1".to_string(),
                kind: "Deployment".to_string(),
                name: "x".to_string(),
            })
            .unwrap();
        assert_eq!(core.group, "");
        assert_eq!(core.version, "v1");
    }

    #[tokio::test]
    async fn test_scale_client_errors_surface() {
        let deps = deps();
        let mapping = deps
            .resource_mapper
            .mapping_for(&recommendation(AlgorithmType::Dsp, "Deployment").spec.target_ref)
            .unwrap();
        let err = deps
            .scale_client
            .get_scale("default", &mapping, "web")
            .await
            .unwrap_err();
        assert!(matches!(err, RecommenderError::MissingPrerequisite(_)));
    }
}
