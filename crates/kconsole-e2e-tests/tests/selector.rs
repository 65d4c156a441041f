//! End-to-end tests for catalog pickers (kconsole-select).
//!
//! These tests verify:
//! 1. Resource items are listed under their display-name annotation
//! 2. Debounced keystrokes filter once the input settles
//! 3. The selection survives filtering and disappears with its item

mod helpers;

use std::time::Duration;

use helpers::{TEST_TIMEOUT, init_tracing};
use kconsole_core::{ResourceItem, ResourceKind};
use kconsole_select::{
    DISPLAY_NAME_ANNOTATION, FilterDebouncer, ItemSelector, NormalizedItems, SelectorConfig,
    SelectorView,
};
use tokio::time::timeout;

fn template(name: &str, title: &str) -> ResourceItem {
    ResourceItem::new(name, ResourceKind::new("template.openshift.io", "v1", "Template"))
        .with_annotation(DISPLAY_NAME_ANNOTATION, title)
}

fn templates() -> NormalizedItems<ResourceItem> {
    NormalizedItems::from_items(vec![
        template("rhel9-server", "Red Hat Enterprise Linux 9"),
        template("fedora-desktop", "Fedora Workstation"),
        template("centos-stream9", "CentOS Stream 9"),
        template("windows2k22", "Microsoft Windows Server 2022"),
    ])
    .expect("template names are unique")
}

fn names(view: &SelectorView<'_, ResourceItem>) -> Vec<String> {
    match view {
        SelectorView::Items(items) => items.names().into_iter().map(str::to_string).collect(),
        _ => Vec::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_debounced_filter_narrows_the_catalog() {
    init_tracing();
    let config = SelectorConfig::default().with_recommended("fedora-desktop");
    let (mut debouncer, mut settled) = FilterDebouncer::new(config.debounce());
    let mut selector = ItemSelector::new(templates(), config);
    selector.initialize();
    assert_eq!(selector.selected(), Some("fedora-desktop"));
    assert!(!selector.is_touched());

    for text in ["w", "wi", "win"] {
        debouncer.schedule(text);
        tokio::time::advance(Duration::from_millis(50)).await;
    }
    assert!(debouncer.is_pending());

    let text = timeout(TEST_TIMEOUT, settled.recv())
        .await
        .expect("filter settles")
        .expect("debouncer alive");
    assert_eq!(text, "win");
    selector.set_filter(text);

    // The recommended selection stays visible even though it does not match.
    assert_eq!(
        names(&selector.view()),
        vec!["fedora-desktop".to_string(), "windows2k22".to_string()]
    );
    assert!(settled.try_recv().is_err(), "Superseded keystrokes are dropped");
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_filter_is_never_delivered() {
    let (mut debouncer, mut settled) = FilterDebouncer::new(Duration::from_millis(200));
    debouncer.schedule("rhel");
    debouncer.cancel();
    tokio::time::advance(Duration::from_secs(1)).await;
    assert!(!debouncer.is_pending());
    assert!(settled.try_recv().is_err());
}

#[test]
fn test_no_matches_offers_clear_filter() {
    let mut selector = ItemSelector::new(templates(), SelectorConfig::default());
    selector.initialize();
    assert_eq!(selector.selected(), None);

    selector.set_filter("solaris");
    assert!(matches!(
        selector.view(),
        SelectorView::NoMatches { filter: "solaris" }
    ));

    selector.clear_filter();
    assert_eq!(names(&selector.view()).len(), 4);
}

#[test]
fn test_removed_item_is_replaced_by_auto_selection() {
    let config = SelectorConfig::default().with_auto_select(true);
    let mut selector = ItemSelector::new(templates(), config);
    selector.initialize();
    assert_eq!(selector.selected(), Some("rhel9-server"));

    selector
        .select("centos-stream9")
        .expect("centos is in the catalog");
    let remaining = NormalizedItems::from_items(vec![
        template("rhel9-server", "Red Hat Enterprise Linux 9"),
        template("windows2k22", "Microsoft Windows Server 2022"),
    ])
    .expect("template names are unique");
    selector.set_items(remaining);
    assert_eq!(selector.selected(), Some("rhel9-server"));

    selector.set_items(NormalizedItems::new());
    assert!(matches!(selector.view(), SelectorView::NoItems));
    assert_eq!(selector.selected(), None);
}
