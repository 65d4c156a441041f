//! Selector configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default debounce window for filter input, in milliseconds.
pub const DEFAULT_DEBOUNCE_MS: u64 = 200;

/// Configuration for an [`ItemSelector`](crate::ItemSelector).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Delay between the last keystroke and the filter recomputation.
    pub debounce_ms: u64,
    /// Select the first visible item when nothing else applies.
    pub auto_select: bool,
    /// Item to pre-select without marking the field as touched.
    pub recommended: Option<String>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            auto_select: false,
            recommended: None,
        }
    }
}

impl SelectorConfig {
    /// Returns the debounce window.
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Set the debounce window.
    #[must_use]
    pub const fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Enable or disable auto-selection of the first visible item.
    #[must_use]
    pub const fn with_auto_select(mut self, enabled: bool) -> Self {
        self.auto_select = enabled;
        self
    }

    /// Set the recommended item name.
    #[must_use]
    pub fn with_recommended(mut self, name: impl Into<String>) -> Self {
        self.recommended = Some(name.into());
        self
    }
}
