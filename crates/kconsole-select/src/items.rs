//! Selectable items and the name-unique collection that holds them.

use std::collections::HashMap;

use kconsole_core::ResourceItem;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Annotation carrying a human-readable title for a resource.
pub const DISPLAY_NAME_ANNOTATION: &str = "openshift.io/display-name";

/// Anything that can be listed in a selector.
pub trait SelectableItem: Clone {
    /// Unique key of the item.
    fn name(&self) -> &str;

    /// Title shown to the user and matched by the filter.
    fn title(&self) -> &str {
        self.name()
    }
}

impl SelectableItem for ResourceItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        self.annotations
            .get(DISPLAY_NAME_ANNOTATION)
            .map_or(self.name.as_str(), String::as_str)
    }
}

/// A catalog tile: a name, a display title and an optional description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    /// Unique key.
    pub name: String,
    /// Display title.
    pub title: String,
    /// Longer description.
    pub description: Option<String>,
}

impl CatalogItem {
    /// Creates a catalog item.
    #[must_use]
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            description: None,
        }
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl SelectableItem for CatalogItem {
    fn name(&self) -> &str {
        &self.name
    }

    fn title(&self) -> &str {
        &self.title
    }
}

/// An ordered collection of items keyed by unique name.
///
/// Iteration follows insertion order, which is the display order.
#[derive(Debug, Clone)]
pub struct NormalizedItems<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Default for NormalizedItems<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: SelectableItem> NormalizedItems<T> {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a collection, preserving the iterator's order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateItem`] if two items share a name.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Result<Self> {
        let mut collection = Self::new();
        for item in items {
            collection.push(item)?;
        }
        Ok(collection)
    }

    fn push(&mut self, item: T) -> Result<()> {
        let name = item.name().to_string();
        if self.index.contains_key(&name) {
            return Err(Error::DuplicateItem(name));
        }
        self.index.insert(name, self.items.len());
        self.items.push(item);
        Ok(())
    }

    /// Looks up an item by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&T> {
        self.index.get(name).map(|&i| &self.items[i])
    }

    /// Returns true if an item with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Returns the first item in display order.
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.items.first()
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates items in display order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    /// Item names in display order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(SelectableItem::name).collect()
    }

    /// Builds a new collection holding the items that satisfy `keep`.
    #[must_use]
    pub fn retain_clone(&self, mut keep: impl FnMut(&T) -> bool) -> Self {
        let items: Vec<T> = self.items.iter().filter(|i| keep(i)).cloned().collect();
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.name().to_string(), i))
            .collect();
        Self { items, index }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kconsole_core::ResourceKind;

    fn catalog() -> NormalizedItems<CatalogItem> {
        NormalizedItems::from_items(vec![
            CatalogItem::new("rhel9", "Red Hat Enterprise Linux 9"),
            CatalogItem::new("fedora", "Fedora"),
            CatalogItem::new("win2k22", "Microsoft Windows Server 2022"),
        ])
        .expect("unique names")
    }

    #[test]
    fn from_items_preserves_order() {
        assert_eq!(catalog().names(), vec!["rhel9", "fedora", "win2k22"]);
    }

    #[test]
    fn from_items_rejects_duplicates() {
        let result = NormalizedItems::from_items(vec![
            CatalogItem::new("fedora", "Fedora"),
            CatalogItem::new("fedora", "Fedora again"),
        ]);
        assert_eq!(result.unwrap_err(), Error::DuplicateItem("fedora".to_string()));
    }

    #[test]
    fn lookup_by_name() {
        let items = catalog();
        assert_eq!(items.get("fedora").map(|i| i.title.as_str()), Some("Fedora"));
        assert!(items.contains("win2k22"));
        assert!(!items.contains("centos"));
        assert_eq!(items.first().map(|i| i.name.as_str()), Some("rhel9"));
    }

    #[test]
    fn retain_clone_reindexes() {
        let items = catalog();
        let subset = items.retain_clone(|i| i.name != "rhel9");
        assert_eq!(subset.len(), 2);
        assert_eq!(subset.get("win2k22").map(|i| i.name.as_str()), Some("win2k22"));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn resource_item_title_uses_display_name() {
        let plain = ResourceItem::new("ocs-rbd", ResourceKind::new("storage.k8s.io", "v1", "StorageClass"));
        assert_eq!(plain.title(), "ocs-rbd");

        let named = plain
            .clone()
            .with_annotation(DISPLAY_NAME_ANNOTATION, "Ceph RBD");
        assert_eq!(named.title(), "Ceph RBD");
        assert_eq!(SelectableItem::name(&named), "ocs-rbd");
    }
}
