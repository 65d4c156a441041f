//! Reference data the form derives defaults from: storage classes, existing
//! claims and the storage class defaults table.

use std::collections::BTreeMap;

use kconsole_core::{Namespace, ResourceItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{AccessMode, SizeUnit, VolumeMode};

/// Name of the config map holding per-storage-class defaults.
pub const STORAGE_CLASS_DEFAULTS_CONFIG_MAP: &str = "kubevirt-storage-class-defaults";

/// Annotation marking the cluster default storage class.
pub const DEFAULT_CLASS_ANNOTATION: &str = "storageclass.kubernetes.io/is-default-class";

/// Reference data that arrives asynchronously.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reference<T> {
    /// Still loading; dependent fields are disabled.
    #[default]
    Loading,
    /// Loaded.
    Loaded(T),
    /// Failed to load.
    Failed(String),
}

impl<T> Reference<T> {
    /// True while loading.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// The loaded value.
    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// The load error.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(error) => Some(error.as_str()),
            _ => None,
        }
    }
}

/// A storage class offered in the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageClassRef {
    /// Class name.
    pub name: String,
    /// Provisioner.
    pub provisioner: String,
    /// Whether this is the cluster default class.
    pub is_default: bool,
}

impl StorageClassRef {
    /// Creates a non-default class.
    #[must_use]
    pub fn new(name: impl Into<String>, provisioner: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provisioner: provisioner.into(),
            is_default: false,
        }
    }

    /// Mark as the cluster default.
    #[must_use]
    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Reads a `StorageClass` object.
    #[must_use]
    pub fn from_item(item: &ResourceItem) -> Self {
        Self {
            name: item.name.clone(),
            provisioner: item
                .attribute_str("/provisioner")
                .unwrap_or_default()
                .to_string(),
            is_default: item
                .annotations
                .get(DEFAULT_CLASS_ANNOTATION)
                .is_some_and(|v| v == "true"),
        }
    }
}

/// An existing claim that can be cloned or attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRef {
    /// Claim name.
    pub name: String,
    /// Claim namespace.
    pub namespace: Namespace,
    /// Requested storage in bytes.
    pub size_bytes: Option<u64>,
    /// Storage class of the claim.
    pub storage_class: Option<String>,
    /// Volume mode of the claim.
    pub volume_mode: Option<VolumeMode>,
}

impl ClaimRef {
    /// Creates a claim reference.
    #[must_use]
    pub fn new(name: impl Into<String>, namespace: Namespace) -> Self {
        Self {
            name: name.into(),
            namespace,
            size_bytes: None,
            storage_class: None,
            volume_mode: None,
        }
    }

    /// Set the requested size.
    #[must_use]
    pub const fn with_size_bytes(mut self, bytes: u64) -> Self {
        self.size_bytes = Some(bytes);
        self
    }

    /// Set the storage class.
    #[must_use]
    pub fn with_storage_class(mut self, class: impl Into<String>) -> Self {
        self.storage_class = Some(class.into());
        self
    }

    /// Set the volume mode.
    #[must_use]
    pub const fn with_volume_mode(mut self, mode: VolumeMode) -> Self {
        self.volume_mode = Some(mode);
        self
    }

    /// Reads a `PersistentVolumeClaim` object.
    ///
    /// Returns `None` for an item without a namespace. Unparseable sizes and
    /// volume modes are logged and left unset.
    #[must_use]
    pub fn from_item(item: &ResourceItem) -> Option<Self> {
        let Some(namespace) = item.namespace.clone() else {
            warn!(claim = %item.name, "Ignoring claim without namespace");
            return None;
        };
        let size_bytes = item
            .attribute_str("/spec/resources/requests/storage")
            .and_then(|quantity| match SizeUnit::parse_quantity(quantity) {
                Ok(bytes) => Some(bytes),
                Err(error) => {
                    warn!(claim = %item.name, error = %error, "Ignoring claim size");
                    None
                }
            });
        let volume_mode = item
            .attribute_str("/spec/volumeMode")
            .and_then(|mode| match mode.parse::<VolumeMode>() {
                Ok(mode) => Some(mode),
                Err(error) => {
                    warn!(claim = %item.name, error = %error, "Ignoring claim volume mode");
                    None
                }
            });
        Some(Self {
            name: item.name.clone(),
            namespace,
            size_bytes,
            storage_class: item.attribute_str("/spec/storageClassName").map(str::to_string),
            volume_mode,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ModeDefaults {
    access_mode: Option<AccessMode>,
    volume_mode: Option<VolumeMode>,
}

/// Default access and volume modes per storage class.
///
/// Per-class entries win over the global ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageClassDefaults {
    global: ModeDefaults,
    per_class: BTreeMap<String, ModeDefaults>,
}

impl StorageClassDefaults {
    /// No defaults at all.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses the string data of the defaults config map.
    ///
    /// Keys are `accessMode`, `volumeMode`, `<class>.accessMode` and
    /// `<class>.volumeMode`. Unknown keys and values are skipped.
    #[must_use]
    pub fn from_config_map<'a>(data: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut defaults = Self::default();
        for (key, value) in data {
            let (slot, field) = match key.rsplit_once('.') {
                Some((class, field)) => (
                    defaults.per_class.entry(class.to_string()).or_default(),
                    field,
                ),
                None => (&mut defaults.global, key),
            };
            match field {
                "accessMode" => match value.parse() {
                    Ok(mode) => slot.access_mode = Some(mode),
                    Err(error) => warn!(key, error = %error, "Ignoring storage class default"),
                },
                "volumeMode" => match value.parse() {
                    Ok(mode) => slot.volume_mode = Some(mode),
                    Err(error) => warn!(key, error = %error, "Ignoring storage class default"),
                },
                _ => debug!(key, "unknown storage class defaults key"),
            }
        }
        defaults.per_class.retain(|_, d| *d != ModeDefaults::default());
        defaults
    }

    /// Reads the defaults config map object; its `data` holds the entries.
    #[must_use]
    pub fn from_item(item: &ResourceItem) -> Self {
        let entries = item
            .attributes
            .pointer("/data")
            .and_then(serde_json::Value::as_object)
            .map(|data| {
                data.iter()
                    .filter_map(|(k, v)| Some((k.as_str(), v.as_str()?)))
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();
        Self::from_config_map(entries)
    }

    /// Set the global access mode.
    #[must_use]
    pub const fn with_access_mode(mut self, mode: AccessMode) -> Self {
        self.global.access_mode = Some(mode);
        self
    }

    /// Set the global volume mode.
    #[must_use]
    pub const fn with_volume_mode(mut self, mode: VolumeMode) -> Self {
        self.global.volume_mode = Some(mode);
        self
    }

    /// Set the access mode of one class.
    #[must_use]
    pub fn with_class_access_mode(mut self, class: impl Into<String>, mode: AccessMode) -> Self {
        self.per_class.entry(class.into()).or_default().access_mode = Some(mode);
        self
    }

    /// Set the volume mode of one class.
    #[must_use]
    pub fn with_class_volume_mode(mut self, class: impl Into<String>, mode: VolumeMode) -> Self {
        self.per_class.entry(class.into()).or_default().volume_mode = Some(mode);
        self
    }

    /// Default access mode for `class`, or the global one.
    #[must_use]
    pub fn access_mode(&self, class: Option<&str>) -> Option<AccessMode> {
        class
            .and_then(|c| self.per_class.get(c))
            .and_then(|d| d.access_mode)
            .or(self.global.access_mode)
    }

    /// Default volume mode for `class`, or the global one.
    #[must_use]
    pub fn volume_mode(&self, class: Option<&str>) -> Option<VolumeMode> {
        class
            .and_then(|c| self.per_class.get(c))
            .and_then(|d| d.volume_mode)
            .or(self.global.volume_mode)
    }
}
