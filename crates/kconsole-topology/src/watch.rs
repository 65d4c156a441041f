//! Resource watch source interface and an in-memory implementation.

use std::collections::{HashMap, HashSet};
use std::fmt;

use kconsole_core::{Namespace, ResourceItem, ResourceKind};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::factory::{ResourceSet, WatchParams};

/// Identifier of one live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(Uuid);

impl SubscriptionId {
    /// Generates a new random id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A live subscription. The receiver always holds the latest resource set.
#[derive(Debug)]
pub struct Subscription {
    /// Subscription id, used to unsubscribe.
    pub id: SubscriptionId,
    /// Push updates.
    pub updates: watch::Receiver<ResourceSet>,
}

/// Supplier of live resource collections.
pub trait WatchSource: Send + Sync + 'static {
    /// Starts watching `params.kind` in `namespace`, or cluster-wide for
    /// cluster-scoped params.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SubscriptionDenied`] if the watch is refused.
    fn subscribe(&self, namespace: &Namespace, params: &WatchParams) -> Result<Subscription>;

    /// Stops a subscription. Unknown ids are ignored.
    fn unsubscribe(&self, id: SubscriptionId);
}

type ChannelKey = (Option<Namespace>, String);

/// A watch source backed by in-process channels, fed through
/// [`publish`](Self::publish) and [`fail`](Self::fail).
#[derive(Debug, Default)]
pub struct InMemoryWatchSource {
    channels: RwLock<HashMap<ChannelKey, watch::Sender<ResourceSet>>>,
    subscriptions: RwLock<HashMap<SubscriptionId, ChannelKey>>,
    denied: RwLock<HashSet<String>>,
}

impl InMemoryWatchSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the items of `kind` in `namespace` (`None` for cluster-scoped
    /// kinds) and marks them loaded.
    pub fn publish(
        &self,
        namespace: Option<&Namespace>,
        kind: &ResourceKind,
        items: Vec<ResourceItem>,
    ) {
        debug!(kind = %kind, count = items.len(), "publishing resources");
        self.sender(namespace, kind)
            .send_replace(ResourceSet::loaded(items));
    }

    /// Marks `kind` in `namespace` as failed to load.
    pub fn fail(&self, namespace: Option<&Namespace>, kind: &ResourceKind, error: impl Into<String>) {
        self.sender(namespace, kind)
            .send_replace(ResourceSet::failed(error));
    }

    /// Refuses future subscriptions to `kind`.
    pub fn deny(&self, kind: &ResourceKind) {
        self.denied.write().insert(kind.reference());
    }

    /// Number of live subscriptions to `kind` in `namespace`.
    #[must_use]
    pub fn subscriber_count(&self, namespace: Option<&Namespace>, kind: &ResourceKind) -> usize {
        let key = (namespace.cloned(), kind.reference());
        self.subscriptions
            .read()
            .values()
            .filter(|k| **k == key)
            .count()
    }

    /// Number of live subscriptions overall.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.subscriptions.read().len()
    }

    fn sender(&self, namespace: Option<&Namespace>, kind: &ResourceKind) -> watch::Sender<ResourceSet> {
        let key = (namespace.cloned(), kind.reference());
        if let Some(tx) = self.channels.read().get(&key) {
            return tx.clone();
        }
        self.channels
            .write()
            .entry(key)
            .or_insert_with(|| watch::channel(ResourceSet::loading()).0)
            .clone()
    }
}

impl WatchSource for InMemoryWatchSource {
    fn subscribe(&self, namespace: &Namespace, params: &WatchParams) -> Result<Subscription> {
        let reference = params.kind.reference();
        if self.denied.read().contains(&reference) {
            return Err(Error::SubscriptionDenied {
                kind: reference,
                namespace: namespace.to_string(),
                reason: "watch not permitted".to_string(),
            });
        }

        let scope = params.namespaced.then_some(namespace);
        let updates = self.sender(scope, &params.kind).subscribe();
        let id = SubscriptionId::new();
        self.subscriptions
            .write()
            .insert(id, (scope.cloned(), reference.clone()));

        info!(
            subscription = %id,
            kind = %reference,
            namespace = %namespace,
            "Subscribed to resource watch"
        );
        Ok(Subscription { id, updates })
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        if self.subscriptions.write().remove(&id).is_some() {
            debug!(subscription = %id, "unsubscribed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> Namespace {
        Namespace::new(name).expect("valid namespace")
    }

    fn pods() -> ResourceKind {
        ResourceKind::core("Pod")
    }

    #[test]
    fn subscription_sees_latest_published_set() {
        let source = InMemoryWatchSource::new();
        let shop = ns("shop");
        source.publish(Some(&shop), &pods(), vec![ResourceItem::new("web-1", pods())]);

        let sub = source
            .subscribe(&shop, &WatchParams::new(pods()))
            .expect("subscribe");
        let set = sub.updates.borrow().clone();
        assert!(set.loaded);
        assert_eq!(set.items.len(), 1);
    }

    #[test]
    fn unpublished_kind_starts_loading() {
        let source = InMemoryWatchSource::new();
        let sub = source
            .subscribe(&ns("shop"), &WatchParams::new(pods()))
            .expect("subscribe");
        assert_eq!(*sub.updates.borrow(), ResourceSet::loading());
    }

    #[test]
    fn namespaces_are_isolated() {
        let source = InMemoryWatchSource::new();
        let sub = source
            .subscribe(&ns("shop"), &WatchParams::new(pods()))
            .expect("subscribe");
        source.publish(Some(&ns("other")), &pods(), vec![ResourceItem::new("x", pods())]);
        assert!(!sub.updates.borrow().loaded);
    }

    #[test]
    fn cluster_scoped_watch_ignores_namespace() {
        let source = InMemoryWatchSource::new();
        let classes = ResourceKind::new("storage.k8s.io", "v1", "StorageClass");
        source.publish(None, &classes, vec![ResourceItem::new("standard", classes.clone())]);

        let sub = source
            .subscribe(&ns("shop"), &WatchParams::new(classes.clone()).cluster_scoped())
            .expect("subscribe");
        assert_eq!(sub.updates.borrow().items.len(), 1);
        assert_eq!(source.subscriber_count(None, &classes), 1);
    }

    #[test]
    fn failures_are_pushed() {
        let source = InMemoryWatchSource::new();
        let shop = ns("shop");
        let mut sub = source
            .subscribe(&shop, &WatchParams::new(pods()))
            .expect("subscribe");
        source.fail(Some(&shop), &pods(), "forbidden");
        assert!(sub.updates.has_changed().expect("sender alive"));
        assert_eq!(
            sub.updates.borrow_and_update().load_error.as_deref(),
            Some("forbidden")
        );
    }

    #[test]
    fn denied_kinds_are_refused() {
        let source = InMemoryWatchSource::new();
        let secrets = ResourceKind::core("Secret");
        source.deny(&secrets);
        let result = source.subscribe(&ns("shop"), &WatchParams::new(secrets));
        assert!(matches!(result, Err(Error::SubscriptionDenied { .. })));
    }

    #[test]
    fn unsubscribe_tracks_counts() {
        let source = InMemoryWatchSource::new();
        let shop = ns("shop");
        let a = source
            .subscribe(&shop, &WatchParams::new(pods()))
            .expect("subscribe");
        let _b = source
            .subscribe(&shop, &WatchParams::new(pods()))
            .expect("subscribe");
        assert_eq!(source.subscriber_count(Some(&shop), &pods()), 2);

        source.unsubscribe(a.id);
        source.unsubscribe(a.id);
        assert_eq!(source.subscriber_count(Some(&shop), &pods()), 1);
        assert_eq!(source.active_subscriptions(), 1);
    }
}
