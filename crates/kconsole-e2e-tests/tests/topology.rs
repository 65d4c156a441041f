//! End-to-end tests for the topology pipeline (kconsole-topology).
//!
//! These tests verify:
//! 1. Watch pushes from several factories merge into one model
//! 2. Optional resources that cannot be watched count as empty
//! 3. A failing factory is isolated from the others
//! 4. Namespace switches discard the previous namespace's data

mod helpers;

use std::collections::BTreeMap;
use std::sync::Arc;

use helpers::{init_tracing, ns, wait_for_model};
use kconsole_core::{ResourceItem, ResourceKind};
use kconsole_topology::{
    Aggregator, FactoryDescriptor, GraphEdge, GraphGroup, GraphNode, InMemoryWatchSource,
    ModelContext, ModelController, PartialModel, TopologyConfig, TransformError, WatchParams,
};
use serde_json::json;

fn deployments() -> ResourceKind {
    ResourceKind::new("apps", "v1", "Deployment")
}

fn services() -> ResourceKind {
    ResourceKind::core("Service")
}

fn routes() -> ResourceKind {
    ResourceKind::new("route.openshift.io", "v1", "Route")
}

fn metrics() -> ResourceKind {
    ResourceKind::new("metrics.k8s.io", "v1beta1", "PodMetrics")
}

fn deployment(name: &str, app: &str) -> ResourceItem {
    ResourceItem::new(name, deployments()).with_label("app", app)
}

fn service(name: &str, target: &str) -> ResourceItem {
    ResourceItem::new(name, services()).with_attributes(json!({"spec": {"selector": {"app": target}}}))
}

/// Workloads become nodes grouped by their `app` label.
fn workloads_factory() -> FactoryDescriptor {
    FactoryDescriptor::new("workloads", 10, |_, resources| {
        let mut groups: BTreeMap<String, GraphGroup> = BTreeMap::new();
        let mut model = PartialModel::new();
        for item in resources.items("deployments") {
            let mut node = GraphNode::new(item.name.as_str(), "workload")
                .with_label(item.name.as_str())
                .with_resource(item.key());
            if let Some(app) = item.labels.get("app") {
                node = node.in_group(app.as_str());
                let group = groups
                    .remove(app)
                    .unwrap_or_else(|| GraphGroup::new(app.as_str()).with_label(app.as_str()));
                groups.insert(app.clone(), group.with_member(item.name.as_str()));
            }
            model = model.with_node(node);
        }
        let routed = resources.items("routes").len();
        let model = model
            .with_node(GraphNode::new("summary", "summary").with_data("routes", json!(routed)));
        Ok(groups.into_values().fold(model, PartialModel::with_group))
    })
    .with_resource("deployments", WatchParams::new(deployments()))
    .with_resource("routes", WatchParams::new(routes()).optional())
}

/// Services become nodes with an edge to the workload they select.
fn services_factory() -> FactoryDescriptor {
    FactoryDescriptor::new("services", 0, |_, resources| {
        Ok(resources
            .items("services")
            .iter()
            .fold(PartialModel::new(), |model, item| {
                let id = format!("svc-{}", item.name);
                let model = model.with_node(GraphNode::new(id.as_str(), "service"));
                match item.attribute_str("/spec/selector/app") {
                    Some(target) => model.with_edge(GraphEdge::new(
                        format!("{id}->{target}"),
                        "connects-to",
                        id.as_str(),
                        target,
                    )),
                    None => model,
                }
            }))
    })
    .with_resource("services", WatchParams::new(services()))
}

/// Always fails once its metrics arrive.
fn metrics_factory() -> FactoryDescriptor {
    FactoryDescriptor::new("metrics", 5, |_, _| {
        Err(TransformError::new("metrics payload is malformed"))
    })
    .with_resource("metrics", WatchParams::new(metrics()))
}

fn controller(
    source: &Arc<InMemoryWatchSource>,
    config: TopologyConfig,
) -> ModelController<InMemoryWatchSource> {
    let mut aggregator = Aggregator::new(config);
    for factory in [workloads_factory(), services_factory(), metrics_factory()] {
        aggregator
            .register(Arc::new(factory))
            .expect("factory ids are unique");
    }
    ModelController::new(Arc::clone(source), ModelContext::new(aggregator))
}

#[tokio::test]
async fn test_watched_resources_merge_into_one_model() {
    init_tracing();
    let source = Arc::new(InMemoryWatchSource::new());
    let shop = ns("shop");
    source.deny(&routes());
    source.publish(
        Some(&shop),
        &deployments(),
        vec![deployment("web", "storefront"), deployment("api", "storefront")],
    );
    source.publish(
        Some(&shop),
        &services(),
        vec![service("web", "web"), service("ghost", "missing")],
    );
    source.publish(Some(&shop), &metrics(), vec![]);

    let controller = controller(&source, TopologyConfig::default());
    let mut rx = controller.subscribe();
    controller.set_namespace(shop.clone());

    let model = wait_for_model(&mut rx, |m| {
        m.is_loaded() && m.node("svc-web").is_some() && m.node("api").is_some()
    })
    .await;

    assert_eq!(model.namespace.as_ref(), Some(&shop));
    let group = model.group("storefront").expect("storefront group");
    let members: Vec<&str> = group.members.iter().map(|m| m.as_str()).collect();
    assert!(members.contains(&"web"));
    assert!(members.contains(&"api"));

    assert!(model.edge("svc-web->web").is_some());
    assert!(
        model.edge("svc-ghost->missing").is_none(),
        "Edges to missing nodes are dropped"
    );

    let summary = model.node("summary").expect("summary node");
    assert_eq!(summary.data.get("routes"), Some(&json!(0)));

    assert_eq!(model.failures.len(), 1);
    assert!(model.failures.contains_key("metrics"));
    assert!(model.has_failures());
}

#[tokio::test]
async fn test_failed_required_resource_fails_only_its_factory() {
    init_tracing();
    let source = Arc::new(InMemoryWatchSource::new());
    let shop = ns("shop");
    source.publish(Some(&shop), &deployments(), vec![deployment("web", "storefront")]);
    source.fail(Some(&shop), &services(), "services is forbidden");
    source.publish(Some(&shop), &routes(), vec![]);

    let controller = controller(&source, TopologyConfig::default());
    let mut rx = controller.subscribe();
    controller.set_namespace(shop.clone());

    let model = wait_for_model(&mut rx, |m| {
        m.failures.contains_key("services") && m.node("web").is_some()
    })
    .await;
    assert!(model.failures["services"].message.contains("services is forbidden"));
    assert!(model.pending.contains("metrics"), "metrics were never published");
    assert!(!model.is_loaded());
}

#[tokio::test]
async fn test_namespace_switch_discards_previous_data() {
    init_tracing();
    let source = Arc::new(InMemoryWatchSource::new());
    let shop = ns("shop");
    let billing = ns("billing");
    source.publish(Some(&shop), &deployments(), vec![deployment("web", "storefront")]);
    source.publish(Some(&billing), &deployments(), vec![deployment("ledger", "billing")]);
    source.publish(Some(&shop), &routes(), vec![]);
    source.publish(Some(&billing), &routes(), vec![]);

    let controller = controller(&source, TopologyConfig::default());
    let mut rx = controller.subscribe();

    controller.set_namespace(shop.clone());
    wait_for_model(&mut rx, |m| m.node("web").is_some()).await;
    let shop_watches = source.subscriber_count(Some(&shop), &deployments());
    assert_eq!(shop_watches, 1);

    let generation = controller.set_namespace(billing.clone());
    assert_eq!(controller.context().lock().generation(), generation);
    assert_eq!(source.subscriber_count(Some(&shop), &deployments()), 0);

    let model = wait_for_model(&mut rx, |m| m.node("ledger").is_some()).await;
    assert_eq!(model.namespace.as_ref(), Some(&billing));
    assert!(model.node("web").is_none());

    // Late pushes for the old namespace never reach the model.
    source.publish(Some(&shop), &deployments(), vec![deployment("late", "storefront")]);
    source.publish(Some(&billing), &deployments(), vec![deployment("journal", "billing")]);
    let model = wait_for_model(&mut rx, |m| m.node("journal").is_some()).await;
    assert!(model.node("late").is_none());

    controller.shutdown();
    assert_eq!(controller.active_watches(), 0);
    assert_eq!(source.active_subscriptions(), 0);
}

#[tokio::test]
async fn test_pending_models_can_be_held_back() {
    init_tracing();
    let source = Arc::new(InMemoryWatchSource::new());
    let shop = ns("shop");

    let controller = controller(
        &source,
        TopologyConfig::default().with_publish_pending_models(false),
    );
    let mut rx = controller.subscribe();
    controller.set_namespace(shop.clone());

    source.publish(Some(&shop), &deployments(), vec![deployment("web", "storefront")]);
    source.publish(Some(&shop), &routes(), vec![]);
    source.publish(Some(&shop), &services(), vec![service("web", "web")]);
    source.publish(Some(&shop), &metrics(), vec![]);

    let model = wait_for_model(&mut rx, |m| m.node("web").is_some()).await;
    assert!(model.is_loaded(), "Only complete models are published");
    assert!(model.edge("svc-web->web").is_some());
}
