//! Test helpers for E2E tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use kconsole_core::Namespace;
use kconsole_topology::GraphModel;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing_subscriber::EnvFilter;

/// Default test timeout.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Parse a namespace, panicking on invalid test input.
pub fn ns(name: &str) -> Namespace {
    Namespace::new(name).expect("valid namespace")
}

/// Wait until the published model satisfies `predicate`.
pub async fn wait_for_model(
    rx: &mut watch::Receiver<Arc<GraphModel>>,
    predicate: impl FnMut(&Arc<GraphModel>) -> bool,
) -> Arc<GraphModel> {
    let model = timeout(TEST_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("model should arrive before the timeout")
        .expect("model sender should be alive");
    Arc::clone(&model)
}
