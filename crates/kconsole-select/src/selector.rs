//! Selection state with fuzzy filtering and auto-selection.
//!
//! Auto-selection runs whenever nothing is selected, in this order:
//!
//! 1. exactly one item exists (unfiltered): select it
//! 2. the configured recommended item exists: select it, leave `touched` unset
//! 3. auto-select is enabled and the filtered list is non-empty: select its
//!    first entry

use tracing::debug;

use crate::config::SelectorConfig;
use crate::error::{Error, Result};
use crate::fuzzy::filter_items;
use crate::items::{NormalizedItems, SelectableItem};

/// What a selector should render.
#[derive(Debug)]
pub enum SelectorView<'a, T> {
    /// The source collection is empty; no grid is shown.
    NoItems,
    /// The filter hides every item; a clear-filter action is offered.
    NoMatches {
        /// The filter that produced no matches.
        filter: &'a str,
    },
    /// Items to display, in display order.
    Items(&'a NormalizedItems<T>),
}

/// Selection state over a [`NormalizedItems`] collection.
#[derive(Debug, Clone)]
pub struct ItemSelector<T> {
    config: SelectorConfig,
    items: NormalizedItems<T>,
    filtered: NormalizedItems<T>,
    filter: String,
    selected: Option<String>,
    touched: bool,
}

impl<T: SelectableItem> ItemSelector<T> {
    /// Creates a selector with no filter and no selection.
    ///
    /// Call [`ItemSelector::initialize`] to apply auto-selection.
    #[must_use]
    pub fn new(items: NormalizedItems<T>, config: SelectorConfig) -> Self {
        let filtered = items.clone();
        Self {
            config,
            items,
            filtered,
            filter: String::new(),
            selected: None,
            touched: false,
        }
    }

    /// Applies the auto-selection policy.
    pub fn initialize(&mut self) {
        self.auto_select();
    }

    /// Selects an item on behalf of the user.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownItem`] if the name is not in the collection.
    pub fn select(&mut self, name: &str) -> Result<()> {
        if !self.items.contains(name) {
            return Err(Error::UnknownItem(name.to_string()));
        }
        self.selected = Some(name.to_string());
        self.touched = true;
        self.refilter();
        Ok(())
    }

    /// Clears the selection. Auto-selection does not re-run until the
    /// filter or the items change.
    pub fn clear_selection(&mut self) {
        self.selected = None;
        self.touched = true;
        self.refilter();
    }

    /// Sets the filter text and recomputes the visible items.
    pub fn set_filter(&mut self, text: impl Into<String>) {
        self.filter = text.into();
        self.refilter();
        self.auto_select();
    }

    /// Clears the filter.
    pub fn clear_filter(&mut self) {
        self.set_filter(String::new());
    }

    /// Replaces the source collection.
    ///
    /// A selection whose item disappeared is dropped, then auto-selection
    /// runs again.
    pub fn set_items(&mut self, items: NormalizedItems<T>) {
        self.items = items;
        let vanished = self
            .selected
            .as_deref()
            .is_some_and(|name| !self.items.contains(name));
        if vanished {
            debug!(item = ?self.selected, "selected item removed from collection");
            self.selected = None;
        }
        self.refilter();
        self.auto_select();
    }

    /// The selected item name.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The selected item.
    #[must_use]
    pub fn selected_item(&self) -> Option<&T> {
        self.selected.as_deref().and_then(|n| self.items.get(n))
    }

    /// Whether the user has interacted with the selection.
    #[must_use]
    pub fn is_touched(&self) -> bool {
        self.touched
    }

    /// Current filter text.
    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// All items, unfiltered.
    #[must_use]
    pub fn items(&self) -> &NormalizedItems<T> {
        &self.items
    }

    /// Items visible under the current filter.
    #[must_use]
    pub fn filtered(&self) -> &NormalizedItems<T> {
        &self.filtered
    }

    /// What to render.
    #[must_use]
    pub fn view(&self) -> SelectorView<'_, T> {
        if self.items.is_empty() {
            SelectorView::NoItems
        } else if self.filtered.is_empty() {
            SelectorView::NoMatches {
                filter: &self.filter,
            }
        } else {
            SelectorView::Items(&self.filtered)
        }
    }

    fn refilter(&mut self) {
        self.filtered = filter_items(&self.items, &self.filter, self.selected.as_deref());
    }

    fn auto_select(&mut self) {
        if self.selected.is_some() {
            return;
        }

        if self.items.len() == 1 {
            self.selected = self.items.first().map(|i| i.name().to_string());
            self.touched = true;
        } else if let Some(recommended) = self
            .config
            .recommended
            .as_deref()
            .filter(|name| self.items.contains(name))
        {
            self.selected = Some(recommended.to_string());
        } else if self.config.auto_select {
            self.selected = self.filtered.first().map(|i| i.name().to_string());
            if self.selected.is_some() {
                self.touched = true;
            }
        }

        if self.selected.is_some() {
            debug!(item = ?self.selected, touched = self.touched, "auto-selected item");
            self.refilter();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::items::CatalogItem;

    fn catalog(names: &[&str]) -> NormalizedItems<CatalogItem> {
        NormalizedItems::from_items(names.iter().map(|n| CatalogItem::new(*n, n.to_uppercase())))
            .expect("unique names")
    }

    #[test]
    fn single_item_is_selected_on_initialize() {
        let mut selector = ItemSelector::new(catalog(&["fedora"]), SelectorConfig::default());
        selector.initialize();
        assert_eq!(selector.selected(), Some("fedora"));
    }

    #[test]
    fn recommended_item_is_selected_untouched() {
        let config = SelectorConfig::default().with_recommended("centos");
        let mut selector = ItemSelector::new(catalog(&["fedora", "centos", "rhel9"]), config);
        selector.initialize();
        assert_eq!(selector.selected(), Some("centos"));
        assert!(!selector.is_touched());
    }

    #[test]
    fn single_item_wins_over_recommended() {
        let config = SelectorConfig::default().with_recommended("centos");
        let mut selector = ItemSelector::new(catalog(&["fedora"]), config);
        selector.initialize();
        assert_eq!(selector.selected(), Some("fedora"));
    }

    #[test]
    fn missing_recommended_falls_through_to_auto_select() {
        let config = SelectorConfig::default()
            .with_recommended("windows")
            .with_auto_select(true);
        let mut selector = ItemSelector::new(catalog(&["fedora", "centos"]), config);
        selector.initialize();
        assert_eq!(selector.selected(), Some("fedora"));
        assert!(selector.is_touched());
    }

    #[test]
    fn no_selection_without_auto_select() {
        let mut selector = ItemSelector::new(catalog(&["fedora", "centos"]), SelectorConfig::default());
        selector.initialize();
        assert_eq!(selector.selected(), None);
        assert!(!selector.is_touched());
    }

    #[test]
    fn auto_select_uses_first_filtered_entry() {
        let config = SelectorConfig::default().with_auto_select(true);
        let mut selector = ItemSelector::new(catalog(&["fedora", "centos", "rhel9"]), config);
        selector.set_filter("cent");
        assert_eq!(selector.selected(), Some("centos"));
    }

    #[test]
    fn selection_survives_non_matching_filter() {
        let mut selector = ItemSelector::new(catalog(&["fedora", "centos", "rhel9"]), SelectorConfig::default());
        selector.select("fedora").expect("known item");
        selector.set_filter("rhel");

        assert_eq!(selector.filtered().names(), vec!["fedora", "rhel9"]);
        assert_eq!(selector.selected(), Some("fedora"));
        assert!(selector.is_touched());
    }

    #[test]
    fn select_unknown_item_fails() {
        let mut selector = ItemSelector::new(catalog(&["fedora"]), SelectorConfig::default());
        assert_eq!(
            selector.select("windows"),
            Err(Error::UnknownItem("windows".to_string()))
        );
    }

    #[test]
    fn view_distinguishes_no_items_from_no_matches() {
        let empty: ItemSelector<CatalogItem> =
            ItemSelector::new(NormalizedItems::new(), SelectorConfig::default());
        assert!(matches!(empty.view(), SelectorView::NoItems));

        let mut selector = ItemSelector::new(catalog(&["fedora", "centos"]), SelectorConfig::default());
        selector.set_filter("zzz");
        assert!(matches!(selector.view(), SelectorView::NoMatches { filter: "zzz" }));

        selector.clear_filter();
        assert!(matches!(selector.view(), SelectorView::Items(items) if items.len() == 2));
    }

    #[test]
    fn set_items_drops_vanished_selection() {
        let mut selector = ItemSelector::new(catalog(&["fedora", "centos"]), SelectorConfig::default());
        selector.select("fedora").expect("known item");
        selector.set_items(catalog(&["centos", "rhel9"]));
        assert_eq!(selector.selected(), None);
    }

    #[test]
    fn set_items_reruns_auto_selection() {
        let mut selector: ItemSelector<CatalogItem> =
            ItemSelector::new(NormalizedItems::new(), SelectorConfig::default());
        selector.initialize();
        assert_eq!(selector.selected(), None);

        selector.set_items(catalog(&["fedora"]));
        assert_eq!(selector.selected(), Some("fedora"));
    }

    #[test]
    fn clear_selection_does_not_reselect_immediately() {
        let config = SelectorConfig::default().with_auto_select(true);
        let mut selector = ItemSelector::new(catalog(&["fedora", "centos"]), config);
        selector.initialize();
        selector.clear_selection();
        assert_eq!(selector.selected(), None);
    }
}
