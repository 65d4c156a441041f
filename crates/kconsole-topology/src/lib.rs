//! # kconsole-topology
//!
//! The data layer behind the console's topology graph.
//!
//! Plugins contribute [`DataModelFactory`] implementations. Each factory
//! declares the resources it needs and turns them into a [`PartialModel`];
//! the [`Aggregator`] merges all partial models of the active namespace into
//! one [`GraphModel`].
//!
//! - [`FactoryRegistry`]: explicit registration list, ordered by priority
//! - [`Aggregator`]: merge with per-factory failure isolation
//! - [`ModelContext`]: owner of the published model, reset on namespace change
//! - [`ModelController`]: drives a [`WatchSource`] into the context
//!
//! ## Example
//!
//! ```rust
//! use std::collections::BTreeMap;
//! use std::sync::Arc;
//!
//! use kconsole_core::Namespace;
//! use kconsole_topology::{
//!     Aggregator, FactoryDescriptor, GraphNode, PartialModel, TopologyConfig,
//! };
//!
//! let mut aggregator = Aggregator::new(TopologyConfig::default());
//! aggregator
//!     .register(Arc::new(FactoryDescriptor::new("static", 0, |_, _| {
//!         Ok(PartialModel::new().with_node(GraphNode::new("web", "workload")))
//!     })))
//!     .expect("unique id");
//!
//! let namespace = Namespace::new("shop").expect("valid namespace");
//! let model = aggregator.build(&namespace, &BTreeMap::new());
//! assert!(model.node("web").is_some());
//! ```

#![forbid(unsafe_code)]

pub mod aggregator;
pub mod config;
pub mod context;
pub mod controller;
pub mod error;
pub mod factory;
pub mod graph;
mod merge;
pub mod registry;
pub mod watch;

pub use aggregator::{Aggregator, Contribution};
pub use config::TopologyConfig;
pub use context::{ModelContext, ResourceUpdate, WatchPlanEntry};
pub use controller::ModelController;
pub use error::{Error, Result, TransformError};
pub use factory::{
    DataModelFactory, FactoryDescriptor, ResourceRequirements, ResourceSet, ResourceSets,
    WatchParams,
};
pub use graph::{
    EdgeId, FactoryFailure, GraphEdge, GraphGroup, GraphModel, GraphNode, GroupId, NodeId,
    PartialModel,
};
pub use registry::FactoryRegistry;
pub use watch::{InMemoryWatchSource, Subscription, SubscriptionId, WatchSource};
