//! Field validation.
//!
//! Runs on every state and never fails: problems are data in
//! [`DiskValidation`], and submission is blocked while it is not valid.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::reference::Reference;
use crate::state::DiskFormState;
use crate::types::DiskSource;

/// Maximum length of a disk name (DNS-1123 label).
pub const MAX_DISK_NAME_LENGTH: usize = 63;

/// Regex for DNS-1123 labels.
static DNS_LABEL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap_or_else(|_| unreachable!())
});

/// Regex for import URLs: http or https with a host.
static IMPORT_URL_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://[^\s/?#]+([/?#]\S*)?$").unwrap_or_else(|_| unreachable!())
});

/// Regex for container image references.
static IMAGE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9._/:-]*(?:@sha256:[a-f0-9]{64})?$")
        .unwrap_or_else(|_| unreachable!())
});

/// A validated form field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiskField {
    /// Disk name.
    Name,
    /// Source.
    Source,
    /// Bus.
    Bus,
    /// Import URL.
    Url,
    /// Container image.
    Image,
    /// Namespace of the claim to clone.
    ClaimNamespace,
    /// Claim name.
    ClaimName,
    /// Size.
    Size,
    /// Storage class.
    StorageClass,
    /// Access mode.
    AccessMode,
    /// Volume mode.
    VolumeMode,
}

impl DiskField {
    /// Field name as shown in messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Source => "source",
            Self::Bus => "bus",
            Self::Url => "url",
            Self::Image => "image",
            Self::ClaimNamespace => "claim namespace",
            Self::ClaimName => "claim",
            Self::Size => "size",
            Self::StorageClass => "storage class",
            Self::AccessMode => "access mode",
            Self::VolumeMode => "volume mode",
        }
    }
}

impl fmt::Display for DiskField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldStatus {
    /// Filled in and acceptable.
    Valid,
    /// Not used by the selected source.
    Hidden,
    /// Required but empty.
    Empty,
    /// Waiting for reference data; the field is disabled.
    Loading,
    /// Filled in but unacceptable.
    Invalid(String),
}

impl FieldStatus {
    /// Whether this status lets the form submit.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Valid | Self::Hidden)
    }
}

/// Per-field validation of a form state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskValidation {
    /// Status of every field.
    pub fields: BTreeMap<DiskField, FieldStatus>,
    /// True when every field is valid or hidden.
    pub is_valid: bool,
}

impl DiskValidation {
    /// Status of one field.
    #[must_use]
    pub fn status(&self, field: DiskField) -> &FieldStatus {
        self.fields.get(&field).unwrap_or(&FieldStatus::Hidden)
    }

    /// The first field blocking submission, with a message.
    #[must_use]
    pub fn first_error(&self) -> Option<(DiskField, String)> {
        self.fields.iter().find_map(|(field, status)| match status {
            FieldStatus::Valid | FieldStatus::Hidden => None,
            FieldStatus::Empty => Some((*field, "is required".to_string())),
            FieldStatus::Loading => Some((*field, "is still loading".to_string())),
            FieldStatus::Invalid(reason) => Some((*field, reason.clone())),
        })
    }
}

/// Validates every field of `state`.
#[must_use]
pub fn validate(state: &DiskFormState) -> DiskValidation {
    let rules = state.rules();
    let mut fields = BTreeMap::new();

    fields.insert(DiskField::Name, validate_name(state));
    fields.insert(
        DiskField::Source,
        if state.disk_type.supports_source(state.source) {
            FieldStatus::Valid
        } else {
            FieldStatus::Invalid(format!(
                "a {} cannot use the {} source",
                state.disk_type, state.source
            ))
        },
    );
    fields.insert(
        DiskField::Bus,
        if state.disk_type.supports_bus(state.bus) {
            FieldStatus::Valid
        } else {
            FieldStatus::Invalid(format!(
                "a {} cannot use the {} bus",
                state.disk_type, state.bus
            ))
        },
    );
    fields.insert(
        DiskField::Url,
        shown(rules.requires_url, || validate_url(&state.url)),
    );
    fields.insert(
        DiskField::Image,
        shown(rules.requires_image, || validate_image(&state.image)),
    );
    fields.insert(
        DiskField::ClaimNamespace,
        shown(rules.requires_claim_namespace, || {
            if state.claim_namespace.is_some() {
                FieldStatus::Valid
            } else {
                FieldStatus::Empty
            }
        }),
    );
    fields.insert(
        DiskField::ClaimName,
        shown(rules.requires_claim, || validate_claim(state)),
    );
    fields.insert(
        DiskField::Size,
        shown(rules.requires_size, || validate_size(state)),
    );
    fields.insert(
        DiskField::StorageClass,
        shown(rules.uses_storage_class, || validate_storage_class(state)),
    );
    let modes = || match &state.defaults {
        Reference::Loading => FieldStatus::Loading,
        Reference::Loaded(_) | Reference::Failed(_) => FieldStatus::Valid,
    };
    fields.insert(DiskField::AccessMode, shown(rules.uses_storage_class, modes));
    fields.insert(DiskField::VolumeMode, shown(rules.uses_storage_class, modes));

    let is_valid = fields.values().all(FieldStatus::is_ok);
    DiskValidation { fields, is_valid }
}

fn shown(applies: bool, check: impl FnOnce() -> FieldStatus) -> FieldStatus {
    if applies { check() } else { FieldStatus::Hidden }
}

fn validate_name(state: &DiskFormState) -> FieldStatus {
    let name = state.name.as_str();
    if name.is_empty() {
        return FieldStatus::Empty;
    }
    if name.len() > MAX_DISK_NAME_LENGTH {
        return FieldStatus::Invalid(format!(
            "cannot exceed {MAX_DISK_NAME_LENGTH} characters"
        ));
    }
    if !DNS_LABEL_REGEX.is_match(name) {
        return FieldStatus::Invalid(
            "must consist of lowercase alphanumeric characters or '-', and start and end with an alphanumeric character"
                .to_string(),
        );
    }
    if state.used_disk_names.contains(name) {
        return FieldStatus::Invalid(format!("a disk named '{name}' already exists"));
    }
    FieldStatus::Valid
}

fn validate_url(url: &str) -> FieldStatus {
    let url = url.trim();
    if url.is_empty() {
        FieldStatus::Empty
    } else if IMPORT_URL_REGEX.is_match(url) {
        FieldStatus::Valid
    } else {
        FieldStatus::Invalid("URL must start with http:// or https:// and name a host".to_string())
    }
}

fn validate_image(image: &str) -> FieldStatus {
    let image = image.trim();
    if image.is_empty() {
        FieldStatus::Empty
    } else if IMAGE_REGEX.is_match(image) {
        FieldStatus::Valid
    } else {
        FieldStatus::Invalid(
            "must be an image reference such as quay.io/containerdisks/fedora:latest".to_string(),
        )
    }
}

fn validate_claim(state: &DiskFormState) -> FieldStatus {
    let Some(name) = state.claim_name.as_deref() else {
        return FieldStatus::Empty;
    };
    match &state.claims {
        Reference::Loading => return FieldStatus::Loading,
        Reference::Failed(error) => {
            return FieldStatus::Invalid(format!("could not load claims: {error}"));
        }
        Reference::Loaded(_) => {}
    }
    let Some(namespace) = state.claim_lookup_namespace() else {
        return FieldStatus::Invalid("select the claim's namespace first".to_string());
    };
    if state.selected_claim().is_none() {
        return FieldStatus::Invalid(format!(
            "claim '{name}' does not exist in namespace '{namespace}'"
        ));
    }
    if *namespace == state.namespace && state.used_claim_names.contains(name) {
        return FieldStatus::Invalid(format!(
            "claim '{name}' is already used by this virtual machine"
        ));
    }
    FieldStatus::Valid
}

fn validate_size(state: &DiskFormState) -> FieldStatus {
    let text = state.size.trim();
    if text.is_empty() {
        return FieldStatus::Empty;
    }
    let size = match text.parse::<u64>() {
        Ok(size) if size > 0 => size,
        _ => return FieldStatus::Invalid("size must be a positive whole number".to_string()),
    };
    let too_large = || {
        FieldStatus::Invalid(format!(
            "size cannot exceed {} GiB",
            state.config.max_size_gib
        ))
    };
    let Some(bytes) = size.checked_mul(state.unit.bytes()) else {
        return too_large();
    };
    if bytes > state.config.max_size_bytes() {
        return too_large();
    }
    if state.source == DiskSource::ClonePvc {
        if let Some(source_bytes) = state.selected_claim().and_then(|c| c.size_bytes) {
            if bytes < source_bytes {
                return FieldStatus::Invalid(
                    "size cannot be smaller than the source claim".to_string(),
                );
            }
        }
    }
    FieldStatus::Valid
}

fn validate_storage_class(state: &DiskFormState) -> FieldStatus {
    match (&state.storage_classes, state.storage_class.as_deref()) {
        (Reference::Loading, _) => FieldStatus::Loading,
        (_, None) => FieldStatus::Valid,
        (Reference::Failed(error), Some(_)) => {
            FieldStatus::Invalid(format!("could not load storage classes: {error}"))
        }
        (Reference::Loaded(_), Some(name)) => {
            if state.selected_storage_class().is_some() {
                FieldStatus::Valid
            } else {
                FieldStatus::Invalid(format!("storage class '{name}' does not exist"))
            }
        }
    }
}
