//! Merging partial models into one graph.
//!
//! Partial models are fed in precedence order. The first contribution of an
//! id owns it; later contributions with the same id only fill in what is
//! still missing (labels, resource, group, unset `data` keys, group members).

use std::collections::{HashMap, HashSet};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::graph::{EdgeId, GraphEdge, GraphGroup, GraphNode, GroupId, NodeId, PartialModel};

/// Accumulates partial models, deduplicating ids.
#[derive(Debug, Default)]
pub(crate) struct ModelMerger {
    nodes: Vec<GraphNode>,
    node_index: HashMap<NodeId, usize>,
    edges: Vec<GraphEdge>,
    edge_index: HashMap<EdgeId, usize>,
    groups: Vec<GraphGroup>,
    group_index: HashMap<GroupId, usize>,
}

/// Merged graph contents.
pub(crate) struct MergedGraph {
    pub(crate) nodes: Vec<GraphNode>,
    pub(crate) edges: Vec<GraphEdge>,
    pub(crate) groups: Vec<GraphGroup>,
}

impl ModelMerger {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Adds one factory's contribution. Earlier contributions take precedence.
    pub(crate) fn add(&mut self, factory: &str, partial: &PartialModel) {
        for node in &partial.nodes {
            if let Some(&i) = self.node_index.get(&node.id) {
                debug!(factory, node = %node.id, "merging colliding node");
                merge_node(&mut self.nodes[i], node);
            } else {
                self.node_index.insert(node.id.clone(), self.nodes.len());
                self.nodes.push(node.clone());
            }
        }

        for edge in &partial.edges {
            if let Some(&i) = self.edge_index.get(&edge.id) {
                debug!(factory, edge = %edge.id, "merging colliding edge");
                merge_edge(&mut self.edges[i], edge);
            } else {
                self.edge_index.insert(edge.id.clone(), self.edges.len());
                self.edges.push(edge.clone());
            }
        }

        for group in &partial.groups {
            if let Some(&i) = self.group_index.get(&group.id) {
                debug!(factory, group = %group.id, "merging colliding group");
                merge_group(&mut self.groups[i], group);
            } else {
                self.group_index.insert(group.id.clone(), self.groups.len());
                self.groups.push(group.clone());
            }
        }
    }

    /// Resolves group membership and dangling edges.
    pub(crate) fn finish(mut self, drop_dangling_edges: bool) -> MergedGraph {
        for node in &self.nodes {
            if let Some(group_id) = &node.group {
                if let Some(&i) = self.group_index.get(group_id) {
                    self.groups[i].add_member(node.id.clone());
                }
            }
        }

        if drop_dangling_edges {
            let known: HashSet<&NodeId> = self.nodes.iter().map(|n| &n.id).collect();
            let before = self.edges.len();
            self.edges.retain(|e| {
                let keep = known.contains(&e.source) && known.contains(&e.target);
                if !keep {
                    warn!(
                        edge = %e.id,
                        source = %e.source,
                        target = %e.target,
                        "Dropping edge with missing endpoint"
                    );
                }
                keep
            });
            if self.edges.len() != before {
                debug!(dropped = before - self.edges.len(), "dangling edges removed");
            }
        }

        MergedGraph {
            nodes: self.nodes,
            edges: self.edges,
            groups: self.groups,
        }
    }
}

fn fill<T: Clone>(slot: &mut Option<T>, incoming: Option<&T>) {
    if slot.is_none() {
        *slot = incoming.cloned();
    }
}

fn fill_data(data: &mut Map<String, Value>, incoming: &Map<String, Value>) {
    for (key, value) in incoming {
        data.entry(key.clone()).or_insert_with(|| value.clone());
    }
}

fn merge_node(existing: &mut GraphNode, incoming: &GraphNode) {
    fill(&mut existing.label, incoming.label.as_ref());
    fill(&mut existing.resource, incoming.resource.as_ref());
    fill(&mut existing.group, incoming.group.as_ref());
    fill_data(&mut existing.data, &incoming.data);
}

fn merge_edge(existing: &mut GraphEdge, incoming: &GraphEdge) {
    if existing.source != incoming.source || existing.target != incoming.target {
        debug!(
            edge = %existing.id,
            "colliding edge has different endpoints; keeping the higher-priority ones"
        );
    }
    fill_data(&mut existing.data, &incoming.data);
}

fn merge_group(existing: &mut GraphGroup, incoming: &GraphGroup) {
    fill(&mut existing.label, incoming.label.as_ref());
    for member in &incoming.members {
        existing.add_member(member.clone());
    }
    fill_data(&mut existing.data, &incoming.data);
}
