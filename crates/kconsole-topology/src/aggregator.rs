//! The data model aggregator.
//!
//! Each applicable factory produces one contribution per namespace. The
//! aggregator keeps the latest contribution of every factory and merges
//! them into a [`GraphModel`] on demand.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use kconsole_core::Namespace;
use tracing::{debug, info, warn};

use crate::config::TopologyConfig;
use crate::error::{Error, Result};
use crate::factory::{DataModelFactory, ResourceSet, ResourceSets};
use crate::graph::{FactoryFailure, GraphModel, PartialModel};
use crate::merge::ModelMerger;
use crate::registry::FactoryRegistry;

/// The state of one factory's contribution.
#[derive(Debug, Clone, PartialEq)]
pub enum Contribution {
    /// Some required resource has not loaded yet.
    Pending,
    /// The transform succeeded.
    Ready(PartialModel),
    /// A required resource failed to load or the transform failed.
    Failed(FactoryFailure),
}

/// Merges factory contributions into per-namespace graph models.
#[derive(Debug, Default)]
pub struct Aggregator {
    registry: FactoryRegistry,
    config: TopologyConfig,
    contributions: HashMap<Namespace, BTreeMap<String, Contribution>>,
}

impl Aggregator {
    /// Creates an aggregator with no factories.
    #[must_use]
    pub fn new(config: TopologyConfig) -> Self {
        Self {
            registry: FactoryRegistry::new(),
            config,
            contributions: HashMap::new(),
        }
    }

    /// Use an already populated registry.
    #[must_use]
    pub fn with_registry(mut self, registry: FactoryRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registers a factory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateFactory`] if the id is taken.
    pub fn register(&mut self, factory: Arc<dyn DataModelFactory>) -> Result<()> {
        self.registry.register(factory)
    }

    /// The factory registry.
    #[must_use]
    pub const fn registry(&self) -> &FactoryRegistry {
        &self.registry
    }

    /// The aggregator configuration.
    #[must_use]
    pub const fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Re-runs one factory against its latest resource sets and caches the
    /// result for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownFactory`] if no factory has this id.
    pub fn contribute(
        &mut self,
        namespace: &Namespace,
        factory_id: &str,
        resources: &ResourceSets,
    ) -> Result<()> {
        let factory = self
            .registry
            .get(factory_id)
            .cloned()
            .ok_or_else(|| Error::UnknownFactory(factory_id.to_string()))?;

        let per_factory = self.contributions.entry(namespace.clone()).or_default();
        if !factory.is_applicable(namespace) {
            debug!(factory = %factory_id, namespace = %namespace, "factory not applicable");
            per_factory.remove(factory_id);
            return Ok(());
        }

        let contribution = evaluate(factory.as_ref(), namespace, resources);
        per_factory.insert(factory_id.to_string(), contribution);
        Ok(())
    }

    /// Merges the cached contributions for `namespace`.
    ///
    /// Applicable factories that have not contributed yet are reported as
    /// pending.
    #[must_use]
    pub fn merge(&self, namespace: &Namespace) -> GraphModel {
        let empty = BTreeMap::new();
        let contributions = self.contributions.get(namespace).unwrap_or(&empty);
        self.assemble(namespace, contributions)
    }

    /// Builds a model from scratch for `namespace` from per-factory inputs,
    /// keyed by factory id. Nothing is cached.
    #[must_use]
    pub fn build(
        &self,
        namespace: &Namespace,
        inputs: &BTreeMap<String, ResourceSets>,
    ) -> GraphModel {
        let missing = ResourceSets::new();
        let contributions: BTreeMap<String, Contribution> = self
            .registry
            .applicable(namespace)
            .iter()
            .map(|factory| {
                let resources = inputs.get(factory.id()).unwrap_or(&missing);
                (
                    factory.id().to_string(),
                    evaluate(factory.as_ref(), namespace, resources),
                )
            })
            .collect();
        self.assemble(namespace, &contributions)
    }

    /// Drops everything cached for `namespace`.
    pub fn teardown(&mut self, namespace: &Namespace) {
        if let Some(removed) = self.contributions.remove(namespace) {
            info!(
                namespace = %namespace,
                contributions = removed.len(),
                "Tore down topology contributions"
            );
        }
    }

    /// The cached contribution of one factory.
    #[must_use]
    pub fn contribution(&self, namespace: &Namespace, factory_id: &str) -> Option<&Contribution> {
        self.contributions.get(namespace)?.get(factory_id)
    }

    fn assemble(
        &self,
        namespace: &Namespace,
        contributions: &BTreeMap<String, Contribution>,
    ) -> GraphModel {
        let mut model = GraphModel::empty(Some(namespace.clone()));
        let mut merger = ModelMerger::new();

        for factory in self.registry.applicable(namespace) {
            let id = factory.id();
            match contributions.get(id) {
                Some(Contribution::Ready(partial)) => merger.add(id, partial),
                Some(Contribution::Failed(failure)) => {
                    model.failures.insert(id.to_string(), failure.clone());
                }
                Some(Contribution::Pending) | None => {
                    model.pending.insert(id.to_string());
                }
            }
        }

        let merged = merger.finish(self.config.drop_dangling_edges);
        model.nodes = merged.nodes;
        model.edges = merged.edges;
        model.groups = merged.groups;

        debug!(
            namespace = %namespace,
            nodes = model.nodes.len(),
            edges = model.edges.len(),
            groups = model.groups.len(),
            pending = model.pending.len(),
            failures = model.failures.len(),
            "merged topology model"
        );
        model
    }
}

/// Runs one factory against its resources, honoring loading and optional
/// resource semantics.
fn evaluate(
    factory: &dyn DataModelFactory,
    namespace: &Namespace,
    resources: &ResourceSets,
) -> Contribution {
    let mut effective = ResourceSets::new();
    let mut pending = false;

    for (key, params) in factory.resources(namespace) {
        let mut set = resources.set(&key).cloned().unwrap_or_default();
        match set.load_error.take() {
            Some(error) if !params.optional => {
                warn!(
                    factory = %factory.id(),
                    resource = %key,
                    error = %error,
                    "Required resource failed to load"
                );
                return Contribution::Failed(FactoryFailure::new(
                    factory.id(),
                    format!("failed to load {key}: {error}"),
                ));
            }
            Some(_) => effective.insert(key, ResourceSet::loaded(Vec::new())),
            None if !set.loaded => pending = true,
            None => effective.insert(key, set),
        }
    }

    if pending {
        return Contribution::Pending;
    }

    match factory.transform(namespace, &effective) {
        Ok(partial) => Contribution::Ready(partial),
        Err(error) => {
            warn!(
                factory = %factory.id(),
                namespace = %namespace,
                error = %error,
                "Data model transform failed"
            );
            Contribution::Failed(FactoryFailure::new(factory.id(), error.message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransformError;
    use crate::factory::{FactoryDescriptor, WatchParams};
    use crate::graph::{GraphEdge, GraphNode};
    use kconsole_core::{ResourceItem, ResourceKind};
    use serde_json::json;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).expect("valid namespace")
    }

    fn deployments() -> WatchParams {
        WatchParams::new(ResourceKind::new("apps", "v1", "Deployment"))
    }

    fn workloads_factory() -> FactoryDescriptor {
        FactoryDescriptor::new("workloads", 100, |_, resources| {
            Ok(resources
                .items("deployments")
                .iter()
                .fold(PartialModel::new(), |model, item| {
                    model.with_node(
                        GraphNode::new(item.name.as_str(), "workload")
                            .with_resource(item.key())
                            .with_data("kind", json!("Deployment")),
                    )
                }))
        })
        .with_resource("deployments", deployments())
    }

    fn loaded_deployments(names: &[&str]) -> ResourceSets {
        let kind = ResourceKind::new("apps", "v1", "Deployment");
        ResourceSets::new().with_set(
            "deployments",
            ResourceSet::loaded(
                names
                    .iter()
                    .map(|name| ResourceItem::new(*name, kind.clone()))
                    .collect(),
            ),
        )
    }

    fn aggregator() -> Aggregator {
        let mut aggregator = Aggregator::new(TopologyConfig::default());
        aggregator
            .register(Arc::new(workloads_factory()))
            .expect("register");
        aggregator
    }

    #[test]
    fn colliding_nodes_merge_into_one() {
        let mut aggregator = aggregator();
        aggregator
            .register(Arc::new(FactoryDescriptor::new("decorators", 10, |_, _| {
                Ok(PartialModel::new().with_node(
                    GraphNode::new("web", "decorated")
                        .with_label("Web")
                        .with_data("kind", json!("Other"))
                        .with_data("git", json!("https://example.com/web.git")),
                ))
            })))
            .expect("register");

        let mut inputs = BTreeMap::new();
        inputs.insert("workloads".to_string(), loaded_deployments(&["web", "db"]));
        let model = aggregator.build(&ns("shop"), &inputs);

        assert_eq!(model.nodes.len(), 2);
        let web = model.node("web").expect("web node");
        assert_eq!(web.node_type, "workload");
        assert_eq!(web.label.as_deref(), Some("Web"));
        assert_eq!(web.data["kind"], json!("Deployment"));
        assert_eq!(web.data["git"], json!("https://example.com/web.git"));
        assert!(model.is_loaded());
    }

    #[test]
    fn failing_transform_is_isolated() {
        let mut aggregator = aggregator();
        aggregator
            .register(Arc::new(FactoryDescriptor::new("broken", 50, |_, _| {
                Err(TransformError::new("owner reference missing"))
            })))
            .expect("register");

        let mut inputs = BTreeMap::new();
        inputs.insert("workloads".to_string(), loaded_deployments(&["web"]));
        let model = aggregator.build(&ns("shop"), &inputs);

        assert_eq!(model.nodes.len(), 1);
        assert_eq!(model.failures.len(), 1);
        assert_eq!(model.failures["broken"].message, "owner reference missing");
        assert!(model.has_failures());
    }

    #[test]
    fn factories_waiting_on_resources_are_pending() {
        let aggregator = aggregator();
        let model = aggregator.build(&ns("shop"), &BTreeMap::new());
        assert!(model.nodes.is_empty());
        assert!(model.pending.contains("workloads"));
        assert!(!model.is_loaded());
    }

    #[test]
    fn failed_required_resource_records_failure() {
        let mut aggregator = aggregator();
        let sets = ResourceSets::new().with_set("deployments", ResourceSet::failed("forbidden"));
        aggregator
            .contribute(&ns("shop"), "workloads", &sets)
            .expect("contribute");

        let model = aggregator.merge(&ns("shop"));
        assert_eq!(
            model.failures["workloads"].message,
            "failed to load deployments: forbidden"
        );
    }

    #[test]
    fn failed_optional_resource_counts_as_empty() {
        let mut aggregator = Aggregator::new(TopologyConfig::default());
        aggregator
            .register(Arc::new(
                FactoryDescriptor::new("routes", 0, |_, resources| {
                    assert!(resources.set("routes").is_some_and(|s| s.loaded));
                    Ok(PartialModel::new().with_node(GraphNode::new("ingress", "ingress")))
                })
                .with_resource(
                    "routes",
                    WatchParams::new(ResourceKind::new("route.openshift.io", "v1", "Route"))
                        .optional(),
                ),
            ))
            .expect("register");

        let sets = ResourceSets::new().with_set("routes", ResourceSet::failed("not found"));
        aggregator
            .contribute(&ns("shop"), "routes", &sets)
            .expect("contribute");

        let model = aggregator.merge(&ns("shop"));
        assert!(model.failures.is_empty());
        assert!(model.node("ingress").is_some());
    }

    #[test]
    fn contribute_unknown_factory() {
        let mut aggregator = aggregator();
        assert_eq!(
            aggregator.contribute(&ns("shop"), "nope", &ResourceSets::new()),
            Err(Error::UnknownFactory("nope".to_string()))
        );
    }

    #[test]
    fn inapplicable_factories_are_skipped() {
        let mut aggregator = aggregator();
        aggregator
            .register(Arc::new(
                FactoryDescriptor::new("virt", 0, |_, _| {
                    Ok(PartialModel::new().with_node(GraphNode::new("vm", "virtual-machine")))
                })
                .with_applicability(|ns| ns.as_str().starts_with("vm-")),
            ))
            .expect("register");

        let mut inputs = BTreeMap::new();
        inputs.insert("workloads".to_string(), loaded_deployments(&[]));
        assert!(aggregator.build(&ns("shop"), &inputs).node("vm").is_none());
        assert!(aggregator.build(&ns("vm-prod"), &inputs).node("vm").is_some());

        aggregator
            .contribute(&ns("shop"), "virt", &ResourceSets::new())
            .expect("contribute");
        assert!(aggregator.contribution(&ns("shop"), "virt").is_none());
    }

    #[test]
    fn incremental_contributions_and_teardown() {
        let mut aggregator = aggregator();
        let shop = ns("shop");

        aggregator
            .contribute(&shop, "workloads", &loaded_deployments(&["web"]))
            .expect("contribute");
        assert_eq!(aggregator.merge(&shop).nodes.len(), 1);

        aggregator
            .contribute(&shop, "workloads", &loaded_deployments(&["web", "db"]))
            .expect("contribute");
        assert_eq!(aggregator.merge(&shop).nodes.len(), 2);

        aggregator.teardown(&shop);
        assert!(aggregator.contribution(&shop, "workloads").is_none());
        assert!(aggregator.merge(&shop).pending.contains("workloads"));
    }

    #[test]
    fn dangling_edges_dropped_after_merge() {
        let mut aggregator = aggregator();
        aggregator
            .register(Arc::new(FactoryDescriptor::new("connections", 0, |_, _| {
                Ok(PartialModel::new()
                    .with_edge(GraphEdge::new("web-db", "connects-to", "web", "db"))
                    .with_edge(GraphEdge::new("web-cache", "connects-to", "web", "cache")))
            })))
            .expect("register");

        let mut inputs = BTreeMap::new();
        inputs.insert("workloads".to_string(), loaded_deployments(&["web", "db"]));
        let model = aggregator.build(&ns("shop"), &inputs);
        assert_eq!(model.edges.len(), 1);
        assert!(model.edge("web-db").is_some());
    }
}
