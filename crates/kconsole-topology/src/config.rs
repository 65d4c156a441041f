//! Topology configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the aggregator and model context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyConfig {
    /// Drop edges whose source or target node is missing after merge.
    pub drop_dangling_edges: bool,
    /// Publish models while some factories are still waiting for resources.
    pub publish_pending_models: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            drop_dangling_edges: true,
            publish_pending_models: true,
        }
    }
}

impl TopologyConfig {
    /// Keep or drop dangling edges.
    #[must_use]
    pub const fn with_drop_dangling_edges(mut self, enabled: bool) -> Self {
        self.drop_dangling_edges = enabled;
        self
    }

    /// Publish or hold back partially loaded models.
    #[must_use]
    pub const fn with_publish_pending_models(mut self, enabled: bool) -> Self {
        self.publish_pending_models = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TopologyConfig::default();
        assert!(config.drop_dangling_edges);
        assert!(config.publish_pending_models);
    }

    #[test]
    fn test_config_builder() {
        let config = TopologyConfig::default()
            .with_drop_dangling_edges(false)
            .with_publish_pending_models(false);
        assert!(!config.drop_dangling_edges);
        assert!(!config.publish_pending_models);
    }

    #[test]
    fn test_config_from_json() {
        let config: TopologyConfig =
            serde_json::from_str(r#"{"publish_pending_models": false}"#).expect("deserialize");
        assert!(config.drop_dangling_edges);
        assert!(!config.publish_pending_models);
    }
}
