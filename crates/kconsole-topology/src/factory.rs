//! Data model factories: what resources a plugin needs and how it turns them
//! into graph data.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use kconsole_core::{LabelSelector, Namespace, ResourceItem, ResourceKind};
use serde::{Deserialize, Serialize};

use crate::error::TransformError;
use crate::graph::PartialModel;

/// Fetch parameters for one resource a factory depends on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchParams {
    /// Kind to watch.
    pub kind: ResourceKind,

    /// Only items matching this selector are delivered.
    #[serde(default)]
    pub selector: LabelSelector,

    /// A failed load of an optional resource counts as loaded and empty.
    #[serde(default)]
    pub optional: bool,

    /// Watch within the active namespace (`true`) or cluster-wide.
    pub namespaced: bool,
}

impl WatchParams {
    /// Watch a namespaced kind.
    #[must_use]
    pub fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            selector: LabelSelector::default(),
            optional: false,
            namespaced: true,
        }
    }

    /// Restrict delivered items by label.
    #[must_use]
    pub fn with_selector(mut self, selector: LabelSelector) -> Self {
        self.selector = selector;
        self
    }

    /// Mark the resource optional.
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Watch the kind cluster-wide.
    #[must_use]
    pub fn cluster_scoped(mut self) -> Self {
        self.namespaced = false;
        self
    }
}

/// Resources a factory needs, keyed by a factory-chosen name.
pub type ResourceRequirements = BTreeMap<String, WatchParams>;

/// The latest known state of one watched resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceSet {
    /// Items.
    pub items: Vec<ResourceItem>,
    /// Whether the initial list has arrived.
    pub loaded: bool,
    /// Load failure, if any.
    pub load_error: Option<String>,
}

impl ResourceSet {
    /// Not loaded yet.
    #[must_use]
    pub fn loading() -> Self {
        Self::default()
    }

    /// Loaded with these items.
    #[must_use]
    pub fn loaded(items: Vec<ResourceItem>) -> Self {
        Self {
            items,
            loaded: true,
            load_error: None,
        }
    }

    /// Failed to load.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            loaded: false,
            load_error: Some(error.into()),
        }
    }

    /// Returns a copy holding only items that match `selector`.
    #[must_use]
    pub fn select(&self, selector: &LabelSelector) -> Self {
        if selector.is_empty() {
            return self.clone();
        }
        Self {
            items: self
                .items
                .iter()
                .filter(|item| selector.matches(&item.labels))
                .cloned()
                .collect(),
            loaded: self.loaded,
            load_error: self.load_error.clone(),
        }
    }
}

/// The resource sets delivered to one factory, keyed like its
/// [`ResourceRequirements`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceSets {
    sets: BTreeMap<String, ResourceSet>,
}

impl ResourceSets {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection with every required resource still loading.
    #[must_use]
    pub fn loading(requirements: &ResourceRequirements) -> Self {
        Self {
            sets: requirements
                .keys()
                .map(|key| (key.clone(), ResourceSet::loading()))
                .collect(),
        }
    }

    /// Add or replace a set.
    #[must_use]
    pub fn with_set(mut self, key: impl Into<String>, set: ResourceSet) -> Self {
        self.insert(key, set);
        self
    }

    /// Adds or replaces a set.
    pub fn insert(&mut self, key: impl Into<String>, set: ResourceSet) {
        self.sets.insert(key.into(), set);
    }

    /// The set stored under `key`.
    #[must_use]
    pub fn set(&self, key: &str) -> Option<&ResourceSet> {
        self.sets.get(key)
    }

    /// The items stored under `key`, empty if none.
    #[must_use]
    pub fn items(&self, key: &str) -> &[ResourceItem] {
        self.sets
            .get(key)
            .map(|s| s.items.as_slice())
            .unwrap_or_default()
    }
}

/// A pluggable contributor to the topology graph.
pub trait DataModelFactory: Send + Sync + fmt::Debug {
    /// Unique id of this factory.
    fn id(&self) -> &str;

    /// Precedence when merging colliding ids; higher wins.
    fn priority(&self) -> i32;

    /// Resources this factory needs in `namespace`.
    fn resources(&self, namespace: &Namespace) -> ResourceRequirements;

    /// Whether the factory takes part in `namespace`.
    fn is_applicable(&self, _namespace: &Namespace) -> bool {
        true
    }

    /// Turns the factory's resources into graph data.
    ///
    /// # Errors
    ///
    /// Returns a [`TransformError`] that is recorded against this factory only.
    fn transform(
        &self,
        namespace: &Namespace,
        resources: &ResourceSets,
    ) -> Result<PartialModel, TransformError>;
}

type TransformFn =
    dyn Fn(&Namespace, &ResourceSets) -> Result<PartialModel, TransformError> + Send + Sync;
type ApplicableFn = dyn Fn(&Namespace) -> bool + Send + Sync;

/// A factory assembled from data and closures, for plugins that do not need
/// their own type.
#[derive(Clone)]
pub struct FactoryDescriptor {
    id: String,
    priority: i32,
    requirements: ResourceRequirements,
    transform: Arc<TransformFn>,
    applicable: Option<Arc<ApplicableFn>>,
}

impl FactoryDescriptor {
    /// Creates a descriptor with no resource requirements.
    pub fn new<F>(id: impl Into<String>, priority: i32, transform: F) -> Self
    where
        F: Fn(&Namespace, &ResourceSets) -> Result<PartialModel, TransformError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            id: id.into(),
            priority,
            requirements: ResourceRequirements::new(),
            transform: Arc::new(transform),
            applicable: None,
        }
    }

    /// Declare a resource requirement.
    #[must_use]
    pub fn with_resource(mut self, key: impl Into<String>, params: WatchParams) -> Self {
        self.requirements.insert(key.into(), params);
        self
    }

    /// Restrict the namespaces this factory applies to.
    #[must_use]
    pub fn with_applicability<F>(mut self, applicable: F) -> Self
    where
        F: Fn(&Namespace) -> bool + Send + Sync + 'static,
    {
        self.applicable = Some(Arc::new(applicable));
        self
    }
}

impl fmt::Debug for FactoryDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FactoryDescriptor")
            .field("id", &self.id)
            .field("priority", &self.priority)
            .field("requirements", &self.requirements)
            .field("applicable", &self.applicable.is_some())
            .finish_non_exhaustive()
    }
}

impl DataModelFactory for FactoryDescriptor {
    fn id(&self) -> &str {
        &self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn resources(&self, _namespace: &Namespace) -> ResourceRequirements {
        self.requirements.clone()
    }

    fn is_applicable(&self, namespace: &Namespace) -> bool {
        self.applicable.as_ref().is_none_or(|f| f(namespace))
    }

    fn transform(
        &self,
        namespace: &Namespace,
        resources: &ResourceSets,
    ) -> Result<PartialModel, TransformError> {
        (self.transform)(namespace, resources)
    }
}
