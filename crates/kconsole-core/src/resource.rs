//! Resource kinds, items and their identity.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::namespace::Namespace;

/// Group name used in references for the core (legacy) API group.
const CORE_GROUP: &str = "core";

/// A `group/version/kind` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKind {
    /// API group; empty for the core group.
    pub group: String,
    /// API version.
    pub version: String,
    /// Kind name, e.g. `Deployment`.
    pub kind: String,
}

impl ResourceKind {
    /// Creates a new kind.
    #[must_use]
    pub fn new(group: impl Into<String>, version: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            kind: kind.into(),
        }
    }

    /// Creates a kind in the core API group (`v1`).
    #[must_use]
    pub fn core(kind: impl Into<String>) -> Self {
        Self::new("", "v1", kind)
    }

    /// Returns the console reference string, `group~version~kind`.
    #[must_use]
    pub fn reference(&self) -> String {
        let group = if self.group.is_empty() {
            CORE_GROUP
        } else {
            self.group.as_str()
        };
        format!("{group}~{}~{}", self.version, self.kind)
    }

    /// Parses a reference string produced by [`ResourceKind::reference`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidKindReference`] unless the input has exactly
    /// three non-empty `~`-separated parts.
    pub fn parse_reference(reference: &str) -> Result<Self> {
        let parts: Vec<&str> = reference.split('~').collect();
        let [group, version, kind] = parts.as_slice() else {
            return Err(Error::InvalidKindReference(reference.to_string()));
        };
        if group.is_empty() || version.is_empty() || kind.is_empty() {
            return Err(Error::InvalidKindReference(reference.to_string()));
        }
        let group = if *group == CORE_GROUP { "" } else { *group };
        Ok(Self::new(group, *version, *kind))
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reference())
    }
}

/// Identity of a resource item: the `(namespace, name, kind)` tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Namespace, `None` for cluster-scoped resources.
    pub namespace: Option<Namespace>,
    /// Object name.
    pub name: String,
    /// Object kind.
    pub kind: ResourceKind,
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{}/{}/{}", self.kind.reference(), ns, self.name),
            None => write!(f, "{}/{}", self.kind.reference(), self.name),
        }
    }
}

/// A cluster object as delivered by a watch source.
///
/// Kind-specific fields live in `attributes` as raw JSON; consumers pick the
/// fields they understand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceItem {
    /// Object name.
    pub name: String,

    /// Namespace, `None` for cluster-scoped resources.
    pub namespace: Option<Namespace>,

    /// Object kind.
    pub kind: ResourceKind,

    /// Unique object id assigned by the cluster.
    pub uid: Uuid,

    /// Labels.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,

    /// Annotations.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,

    /// Kind-specific attributes.
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl ResourceItem {
    /// Creates a cluster-scoped item with a fresh uid.
    #[must_use]
    pub fn new(name: impl Into<String>, kind: ResourceKind) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind,
            uid: Uuid::new_v4(),
            labels: BTreeMap::new(),
            annotations: BTreeMap::new(),
            created_at: Utc::now(),
            attributes: serde_json::Value::Null,
        }
    }

    /// Places the item in a namespace.
    #[must_use]
    pub fn in_namespace(mut self, namespace: Namespace) -> Self {
        self.namespace = Some(namespace);
        self
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Adds an annotation.
    #[must_use]
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.annotations.insert(key.into(), value.into());
        self
    }

    /// Replaces the kind-specific attributes.
    #[must_use]
    pub fn with_attributes(mut self, attributes: serde_json::Value) -> Self {
        self.attributes = attributes;
        self
    }

    /// Returns the identity of this item.
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            namespace: self.namespace.clone(),
            name: self.name.clone(),
            kind: self.kind.clone(),
        }
    }

    /// Looks up a string attribute by JSON pointer, e.g. `/spec/nodeName`.
    #[must_use]
    pub fn attribute_str(&self, pointer: &str) -> Option<&str> {
        self.attributes.pointer(pointer).and_then(serde_json::Value::as_str)
    }
}
