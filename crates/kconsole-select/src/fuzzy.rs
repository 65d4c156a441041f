//! Subsequence fuzzy matching.

use crate::items::{NormalizedItems, SelectableItem};

/// Returns true if every character of `filter` appears in `title`, in order,
/// ignoring case. Characters need not be contiguous.
///
/// An empty filter matches every title.
#[must_use]
pub fn fuzzy_match(filter: &str, title: &str) -> bool {
    let mut haystack = title.chars().flat_map(char::to_lowercase);
    filter
        .chars()
        .flat_map(char::to_lowercase)
        .all(|needle| haystack.any(|c| c == needle))
}

/// Filters a collection by title, always keeping the `selected` item.
///
/// The result is a new collection in the original display order; `items` is
/// left untouched.
#[must_use]
pub fn filter_items<T: SelectableItem>(
    items: &NormalizedItems<T>,
    filter: &str,
    selected: Option<&str>,
) -> NormalizedItems<T> {
    items.retain_clone(|item| {
        selected == Some(item.name()) || fuzzy_match(filter, item.title())
    })
}
