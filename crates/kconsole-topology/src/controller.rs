//! Async driver connecting a [`WatchSource`] to a [`ModelContext`].

use std::sync::Arc;

use kconsole_core::{LabelSelector, Namespace};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::context::{ModelContext, ResourceUpdate};
use crate::factory::ResourceSet;
use crate::graph::GraphModel;
use crate::watch::{SubscriptionId, WatchSource};

#[derive(Debug)]
struct ActiveWatch {
    subscription: SubscriptionId,
    task: JoinHandle<()>,
}

/// Keeps one subscription per required resource of the active namespace and
/// forwards every push into the model context.
#[derive(Debug)]
pub struct ModelController<W: WatchSource> {
    source: Arc<W>,
    context: Arc<Mutex<ModelContext>>,
    active: Mutex<Vec<ActiveWatch>>,
}

impl<W: WatchSource> ModelController<W> {
    /// Creates a controller with no active namespace.
    #[must_use]
    pub fn new(source: Arc<W>, context: ModelContext) -> Self {
        Self {
            source,
            context: Arc::new(Mutex::new(context)),
            active: Mutex::new(Vec::new()),
        }
    }

    /// A receiver notified on every published model.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<GraphModel>> {
        self.context.lock().subscribe()
    }

    /// The last published model.
    #[must_use]
    pub fn model(&self) -> Arc<GraphModel> {
        self.context.lock().model()
    }

    /// Shared handle to the model context.
    #[must_use]
    pub fn context(&self) -> Arc<Mutex<ModelContext>> {
        Arc::clone(&self.context)
    }

    /// Number of live watches.
    #[must_use]
    pub fn active_watches(&self) -> usize {
        self.active.lock().len()
    }

    /// Makes `namespace` active: tears down the previous watches, resets the
    /// model and subscribes every applicable factory's resources.
    ///
    /// Must be called from within a Tokio runtime. Returns the new
    /// generation.
    pub fn set_namespace(&self, namespace: Namespace) -> u64 {
        self.teardown_watches();

        let (generation, plan) = {
            let mut context = self.context.lock();
            let generation = context.switch_namespace(namespace.clone());
            (generation, context.watch_plan())
        };

        let mut active = Vec::with_capacity(plan.len());
        for entry in plan {
            match self.source.subscribe(&namespace, &entry.params) {
                Ok(subscription) => {
                    let task = tokio::spawn(forward(
                        Arc::clone(&self.context),
                        generation,
                        entry.factory,
                        entry.resource,
                        entry.params.selector,
                        subscription.updates,
                    ));
                    active.push(ActiveWatch {
                        subscription: subscription.id,
                        task,
                    });
                }
                Err(error) => {
                    warn!(
                        factory = %entry.factory,
                        resource = %entry.resource,
                        error = %error,
                        "Failed to subscribe to resource"
                    );
                    self.context.lock().apply_update(ResourceUpdate {
                        generation,
                        factory: entry.factory,
                        resource: entry.resource,
                        set: ResourceSet::failed(error.to_string()),
                    });
                }
            }
        }

        info!(
            namespace = %namespace,
            generation,
            watches = active.len(),
            "Topology watches started"
        );
        *self.active.lock() = active;
        generation
    }

    /// Stops all watches and clears the model.
    pub fn shutdown(&self) {
        self.teardown_watches();
        self.context.lock().clear();
        info!("Topology controller shut down");
    }

    fn teardown_watches(&self) {
        let watches = std::mem::take(&mut *self.active.lock());
        for watch in watches {
            watch.task.abort();
            self.source.unsubscribe(watch.subscription);
        }
    }
}

impl<W: WatchSource> Drop for ModelController<W> {
    fn drop(&mut self) {
        self.teardown_watches();
    }
}

async fn forward(
    context: Arc<Mutex<ModelContext>>,
    generation: u64,
    factory: String,
    resource: String,
    selector: LabelSelector,
    mut updates: watch::Receiver<ResourceSet>,
) {
    loop {
        let set = updates.borrow_and_update().select(&selector);
        let applied = context.lock().apply_update(ResourceUpdate {
            generation,
            factory: factory.clone(),
            resource: resource.clone(),
            set,
        });
        if !applied {
            debug!(factory = %factory, resource = %resource, "watch superseded");
            break;
        }
        if updates.changed().await.is_err() {
            break;
        }
    }
}
