//! The model context: owner of the aggregated model for the active
//! namespace.
//!
//! The model is replaced wholesale on every change and published to views
//! through a `tokio::sync::watch` channel. Updates carry the generation they
//! were scheduled for; anything from an older generation is discarded.

use std::collections::BTreeMap;
use std::sync::Arc;

use kconsole_core::Namespace;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::aggregator::Aggregator;
use crate::factory::{ResourceSet, ResourceSets, WatchParams};
use crate::graph::GraphModel;

/// A new resource set for one factory's resource.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceUpdate {
    /// Generation the watch was started for.
    pub generation: u64,
    /// Factory that declared the resource.
    pub factory: String,
    /// The factory's resource key.
    pub resource: String,
    /// The latest set.
    pub set: ResourceSet,
}

/// One watch the active namespace needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchPlanEntry {
    /// Factory that declared the resource.
    pub factory: String,
    /// The factory's resource key.
    pub resource: String,
    /// What to watch.
    pub params: WatchParams,
}

/// Holds the current aggregated model and exposes it to views.
#[derive(Debug)]
pub struct ModelContext {
    aggregator: Aggregator,
    namespace: Option<Namespace>,
    generation: u64,
    inputs: BTreeMap<String, ResourceSets>,
    model: Arc<GraphModel>,
    tx: watch::Sender<Arc<GraphModel>>,
}

impl ModelContext {
    /// Creates a context with no active namespace.
    #[must_use]
    pub fn new(aggregator: Aggregator) -> Self {
        let model = Arc::new(GraphModel::empty(None));
        let (tx, _rx) = watch::channel(Arc::clone(&model));
        Self {
            aggregator,
            namespace: None,
            generation: 0,
            inputs: BTreeMap::new(),
            model,
            tx,
        }
    }

    /// A receiver that is notified on every published model.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<GraphModel>> {
        self.tx.subscribe()
    }

    /// The last published model.
    #[must_use]
    pub fn model(&self) -> Arc<GraphModel> {
        Arc::clone(&self.model)
    }

    /// The active namespace.
    #[must_use]
    pub const fn namespace(&self) -> Option<&Namespace> {
        self.namespace.as_ref()
    }

    /// The current generation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// The aggregator.
    #[must_use]
    pub const fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    /// Switches to `namespace`, dropping everything from the previous one.
    ///
    /// Returns the new generation; updates tagged with an older one are
    /// ignored from now on.
    pub fn switch_namespace(&mut self, namespace: Namespace) -> u64 {
        if let Some(previous) = self.namespace.take() {
            self.aggregator.teardown(&previous);
        }
        self.generation += 1;

        self.inputs = self
            .aggregator
            .registry()
            .applicable(&namespace)
            .iter()
            .map(|f| {
                (
                    f.id().to_string(),
                    ResourceSets::loading(&f.resources(&namespace)),
                )
            })
            .collect();

        for (factory, sets) in &self.inputs {
            if let Err(error) = self.aggregator.contribute(&namespace, factory, sets) {
                warn!(factory = %factory, error = %error, "Initial contribution failed");
            }
        }

        info!(
            namespace = %namespace,
            generation = self.generation,
            factories = self.inputs.len(),
            "Switched topology namespace"
        );

        let model = self.aggregator.merge(&namespace);
        self.namespace = Some(namespace);
        self.publish(model, true);
        self.generation
    }

    /// Applies a resource update. Returns `false` if it was discarded.
    pub fn apply_update(&mut self, update: ResourceUpdate) -> bool {
        if update.generation != self.generation {
            debug!(
                update_generation = update.generation,
                generation = self.generation,
                factory = %update.factory,
                "discarding stale resource update"
            );
            return false;
        }
        let Some(namespace) = self.namespace.clone() else {
            return false;
        };
        let Some(sets) = self.inputs.get_mut(&update.factory) else {
            debug!(factory = %update.factory, "update for inactive factory");
            return false;
        };

        sets.insert(update.resource, update.set);
        if let Err(error) = self.aggregator.contribute(&namespace, &update.factory, sets) {
            warn!(factory = %update.factory, error = %error, "Contribution failed");
            return false;
        }

        let model = self.aggregator.merge(&namespace);
        self.publish(model, false);
        true
    }

    /// Every watch the active namespace needs.
    #[must_use]
    pub fn watch_plan(&self) -> Vec<WatchPlanEntry> {
        let Some(namespace) = &self.namespace else {
            return Vec::new();
        };
        self.aggregator
            .registry()
            .applicable(namespace)
            .iter()
            .flat_map(|factory| {
                factory
                    .resources(namespace)
                    .into_iter()
                    .map(|(resource, params)| WatchPlanEntry {
                        factory: factory.id().to_string(),
                        resource,
                        params,
                    })
            })
            .collect()
    }

    /// Drops the active namespace and publishes an empty model.
    pub fn clear(&mut self) {
        if let Some(previous) = self.namespace.take() {
            self.aggregator.teardown(&previous);
        }
        self.generation += 1;
        self.inputs.clear();
        self.publish(GraphModel::empty(None), true);
    }

    fn publish(&mut self, model: GraphModel, force: bool) {
        if !force && !model.is_loaded() && !self.aggregator.config().publish_pending_models {
            debug!(pending = model.pending.len(), "holding back partially loaded model");
            return;
        }
        self.model = Arc::new(model);
        self.tx.send_replace(Arc::clone(&self.model));
    }
}
