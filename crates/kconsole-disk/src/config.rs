//! Disk form configuration.

use serde::{Deserialize, Serialize};

use crate::types::SizeUnit;

/// Largest disk the form accepts, in GiB.
pub const DEFAULT_MAX_SIZE_GIB: u64 = 64 * 1024;

/// Configuration for a disk form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiskFormConfig {
    /// Unit selected when the size fields are reset.
    pub default_unit: SizeUnit,
    /// Size filled in when the size fields are reset; empty if `None`.
    pub default_size: Option<u64>,
    /// Upper bound on the requested size, in GiB.
    pub max_size_gib: u64,
    /// Pre-select the cluster default storage class.
    pub preselect_default_storage_class: bool,
}

impl Default for DiskFormConfig {
    fn default() -> Self {
        Self {
            default_unit: SizeUnit::Gi,
            default_size: None,
            max_size_gib: DEFAULT_MAX_SIZE_GIB,
            preselect_default_storage_class: true,
        }
    }
}

impl DiskFormConfig {
    /// Set the default unit.
    #[must_use]
    pub const fn with_default_unit(mut self, unit: SizeUnit) -> Self {
        self.default_unit = unit;
        self
    }

    /// Set the default size.
    #[must_use]
    pub const fn with_default_size(mut self, size: u64) -> Self {
        self.default_size = Some(size);
        self
    }

    /// Set the size limit in GiB.
    #[must_use]
    pub const fn with_max_size_gib(mut self, gib: u64) -> Self {
        self.max_size_gib = gib;
        self
    }

    /// Enable or disable default storage class pre-selection.
    #[must_use]
    pub const fn with_preselect_default_storage_class(mut self, enabled: bool) -> Self {
        self.preselect_default_storage_class = enabled;
        self
    }

    /// The size text the form starts from.
    #[must_use]
    pub fn initial_size(&self) -> String {
        self.default_size.map(|s| s.to_string()).unwrap_or_default()
    }

    /// The size limit in bytes.
    #[must_use]
    pub const fn max_size_bytes(&self) -> u64 {
        self.max_size_gib.saturating_mul(SizeUnit::Gi.bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DiskFormConfig::default();
        assert_eq!(config.default_unit, SizeUnit::Gi);
        assert_eq!(config.initial_size(), "");
        assert_eq!(config.max_size_bytes(), DEFAULT_MAX_SIZE_GIB << 30);
        assert!(config.preselect_default_storage_class);
    }

    #[test]
    fn test_config_builder() {
        let config = DiskFormConfig::default()
            .with_default_unit(SizeUnit::Mi)
            .with_default_size(512)
            .with_max_size_gib(10)
            .with_preselect_default_storage_class(false);
        assert_eq!(config.initial_size(), "512");
        assert_eq!(config.max_size_bytes(), 10 << 30);
        assert!(!config.preselect_default_storage_class);
    }

    #[test]
    fn test_config_from_json() {
        let config: DiskFormConfig =
            serde_json::from_str(r#"{"default_unit": "Ti"}"#).expect("deserialize");
        assert_eq!(config.default_unit, SizeUnit::Ti);
        assert_eq!(config.max_size_gib, DEFAULT_MAX_SIZE_GIB);
    }
}
