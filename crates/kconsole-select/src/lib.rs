//! # kconsole-select
//!
//! List-selection logic behind the console's tile and dropdown pickers.
//!
//! - [`NormalizedItems`]: an ordered, name-unique collection of items
//! - [`fuzzy_match`] / [`filter_items`]: in-order subsequence filtering that
//!   never hides the current selection
//! - [`ItemSelector`]: selection state with the auto-selection policy
//! - [`FilterDebouncer`]: a cancellable deferred filter computation
//!
//! ## Example
//!
//! ```rust
//! use kconsole_select::{CatalogItem, ItemSelector, NormalizedItems, SelectorConfig};
//!
//! let items = NormalizedItems::from_items(vec![
//!     CatalogItem::new("rhel9", "Red Hat Enterprise Linux 9"),
//!     CatalogItem::new("fedora", "Fedora"),
//! ])
//! .expect("unique names");
//!
//! let mut selector = ItemSelector::new(items, SelectorConfig::default().with_recommended("fedora"));
//! selector.initialize();
//! assert_eq!(selector.selected(), Some("fedora"));
//! assert!(!selector.is_touched());
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod debounce;
pub mod error;
pub mod fuzzy;
pub mod items;
pub mod selector;

pub use config::SelectorConfig;
pub use debounce::FilterDebouncer;
pub use error::{Error, Result};
pub use fuzzy::{filter_items, fuzzy_match};
pub use items::{CatalogItem, DISPLAY_NAME_ANNOTATION, NormalizedItems, SelectableItem};
pub use selector::{ItemSelector, SelectorView};
