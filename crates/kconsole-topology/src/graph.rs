//! Graph model types.
//!
//! Factories emit [`PartialModel`]s; the aggregator merges them into one
//! [`GraphModel`] per namespace.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, Utc};
use kconsole_core::{Namespace, ResourceKey};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

macro_rules! graph_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

graph_id!(
    /// Identifier of a graph node, unique within a model.
    NodeId
);
graph_id!(
    /// Identifier of a graph edge, unique within a model.
    EdgeId
);
graph_id!(
    /// Identifier of a graph group, unique within a model.
    GroupId
);

/// A node in the topology graph, usually backed by one workload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node identifier.
    pub id: NodeId,

    /// Renderer hint, e.g. `workload` or `virtual-machine`.
    pub node_type: String,

    /// Display label.
    pub label: Option<String>,

    /// The resource this node represents.
    pub resource: Option<ResourceKey>,

    /// Group this node belongs to.
    pub group: Option<GroupId>,

    /// Free-form renderer data.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl GraphNode {
    /// Creates a node.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, node_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            node_type: node_type.into(),
            label: None,
            resource: None,
            group: None,
            data: Map::new(),
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the backing resource.
    #[must_use]
    pub fn with_resource(mut self, resource: ResourceKey) -> Self {
        self.resource = Some(resource);
        self
    }

    /// Place the node in a group.
    #[must_use]
    pub fn in_group(mut self, group: impl Into<GroupId>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Add a data field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Edge identifier.
    pub id: EdgeId,

    /// Renderer hint, e.g. `connects-to` or `traffic`.
    pub edge_type: String,

    /// Source node.
    pub source: NodeId,

    /// Target node.
    pub target: NodeId,

    /// Free-form renderer data.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl GraphEdge {
    /// Creates an edge.
    #[must_use]
    pub fn new(
        id: impl Into<EdgeId>,
        edge_type: impl Into<String>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
    ) -> Self {
        Self {
            id: id.into(),
            edge_type: edge_type.into(),
            source: source.into(),
            target: target.into(),
            data: Map::new(),
        }
    }

    /// Add a data field.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.data.insert(key.into(), value);
        self
    }
}

/// A visual grouping of nodes, e.g. an application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphGroup {
    /// Group identifier.
    pub id: GroupId,

    /// Display label.
    pub label: Option<String>,

    /// Member nodes in first-seen order.
    pub members: Vec<NodeId>,

    /// Free-form renderer data.
    #[serde(default)]
    pub data: Map<String, Value>,
}

impl GraphGroup {
    /// Creates an empty group.
    #[must_use]
    pub fn new(id: impl Into<GroupId>) -> Self {
        Self {
            id: id.into(),
            label: None,
            members: Vec::new(),
            data: Map::new(),
        }
    }

    /// Set the label.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Add a member node.
    #[must_use]
    pub fn with_member(mut self, node: impl Into<NodeId>) -> Self {
        self.add_member(node.into());
        self
    }

    /// Adds a member unless it is already present.
    pub fn add_member(&mut self, node: NodeId) {
        if !self.members.contains(&node) {
            self.members.push(node);
        }
    }
}

/// The nodes, edges and groups contributed by one factory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialModel {
    /// Nodes.
    pub nodes: Vec<GraphNode>,
    /// Edges.
    pub edges: Vec<GraphEdge>,
    /// Groups.
    pub groups: Vec<GraphGroup>,
}

impl PartialModel {
    /// Creates an empty partial model.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node.
    #[must_use]
    pub fn with_node(mut self, node: GraphNode) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add an edge.
    #[must_use]
    pub fn with_edge(mut self, edge: GraphEdge) -> Self {
        self.edges.push(edge);
        self
    }

    /// Add a group.
    #[must_use]
    pub fn with_group(mut self, group: GraphGroup) -> Self {
        self.groups.push(group);
        self
    }

    /// Returns true if nothing was contributed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty() && self.groups.is_empty()
    }
}

/// A recorded transform or load failure of one factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryFailure {
    /// The failing factory.
    pub factory: String,
    /// What went wrong.
    pub message: String,
    /// When the failure was recorded.
    pub at: DateTime<Utc>,
}

impl FactoryFailure {
    /// Records a failure now.
    #[must_use]
    pub fn new(factory: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            factory: factory.into(),
            message: message.into(),
            at: Utc::now(),
        }
    }
}

/// The merged graph for one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphModel {
    /// Namespace the model was built for; `None` before any namespace is active.
    pub namespace: Option<Namespace>,

    /// Nodes, unique by id.
    pub nodes: Vec<GraphNode>,

    /// Edges, unique by id.
    pub edges: Vec<GraphEdge>,

    /// Groups, unique by id.
    pub groups: Vec<GraphGroup>,

    /// Factories that failed, by id.
    pub failures: BTreeMap<String, FactoryFailure>,

    /// Factories still waiting for resources.
    pub pending: BTreeSet<String>,

    /// Build time.
    pub built_at: DateTime<Utc>,
}

impl GraphModel {
    /// An empty model.
    #[must_use]
    pub fn empty(namespace: Option<Namespace>) -> Self {
        Self {
            namespace,
            nodes: Vec::new(),
            edges: Vec::new(),
            groups: Vec::new(),
            failures: BTreeMap::new(),
            pending: BTreeSet::new(),
            built_at: Utc::now(),
        }
    }

    /// Looks up a node.
    #[must_use]
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }

    /// Looks up an edge.
    #[must_use]
    pub fn edge(&self, id: &str) -> Option<&GraphEdge> {
        self.edges.iter().find(|e| e.id.as_str() == id)
    }

    /// Looks up a group.
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&GraphGroup> {
        self.groups.iter().find(|g| g.id.as_str() == id)
    }

    /// True once no factory is waiting for resources.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.pending.is_empty()
    }

    /// True if any factory failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
