//! # kconsole-core
//!
//! Shared resource vocabulary for the kconsole crates.
//!
//! Every other crate in the workspace speaks in terms of the types defined
//! here:
//!
//! - [`Namespace`]: a validated scoping boundary for resources and models
//! - [`ResourceKind`]: a `group/version/kind` triple with its console
//!   reference form (`apps~v1~Deployment`)
//! - [`ResourceItem`]: a cluster object as delivered by a watch source
//! - [`ResourceKey`]: the `(namespace, name, kind)` identity of an item
//! - [`LabelSelector`]: equality-based label matching
//!
//! ## Example
//!
//! ```rust
//! use kconsole_core::{Namespace, ResourceItem, ResourceKind};
//!
//! let ns = Namespace::new("default").expect("valid namespace");
//! let kind = ResourceKind::new("apps", "v1", "Deployment");
//! let item = ResourceItem::new("frontend", kind.clone()).in_namespace(ns.clone());
//!
//! assert_eq!(kind.reference(), "apps~v1~Deployment");
//! assert_eq!(item.key().namespace, Some(ns));
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod namespace;
pub mod resource;
pub mod selector;

pub use error::{Error, Result};
pub use namespace::{NAMESPACE_MAX_LENGTH, Namespace};
pub use resource::{ResourceItem, ResourceKey, ResourceKind};
pub use selector::LabelSelector;
