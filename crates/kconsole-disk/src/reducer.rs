//! The pure form reducer: `(state, event) -> state`.

use tracing::debug;

use crate::state::{DiskFormEvent, DiskFormState, FormPhase};
use crate::types::{DiskSource, SizeUnit};

/// Applies one event to the form.
///
/// Rules:
/// - user input is ignored while inputs are disabled
/// - switching source clears every source-specific field
/// - a disk type that cannot use the current source switches to its default
///   source, and an unsupported bus falls back to the type's default bus
/// - access and volume modes follow the storage class defaults unless the
///   user picked something other than the previous default
/// - a claim-backed source takes the volume mode of its claim, and the user
///   cannot change it
/// - preallocation only applies to blank disks
/// - defaults wait for their reference data to load
#[must_use]
pub fn reduce(mut state: DiskFormState, event: DiskFormEvent) -> DiskFormState {
    if event.is_edit() && !state.is_editable() {
        debug!(event = ?event, phase = ?state.phase, "ignoring input while form is locked");
        return state;
    }

    match event {
        DiskFormEvent::SetName(name) => state.name = name,
        DiskFormEvent::SetSource(source) => {
            if source == state.source {
                return state;
            }
            if state.disk_type.supports_source(source) {
                switch_source(&mut state, source);
            } else {
                debug!(
                    source = %source,
                    disk_type = %state.disk_type,
                    "source not available for disk type"
                );
            }
        }
        DiskFormEvent::SetDiskType(disk_type) => {
            state.disk_type = disk_type;
            if !disk_type.supports_source(state.source) {
                switch_source(&mut state, disk_type.default_source());
            }
            if !disk_type.supports_bus(state.bus) {
                state.bus = disk_type.default_bus();
            }
        }
        DiskFormEvent::SetBus(bus) => {
            if state.disk_type.supports_bus(bus) {
                state.bus = bus;
            } else {
                debug!(bus = %bus, disk_type = %state.disk_type, "bus not supported");
            }
        }
        DiskFormEvent::SetUrl(url) => state.url = url,
        DiskFormEvent::SetImage(image) => state.image = image,
        DiskFormEvent::SetClaimNamespace(namespace) => {
            if namespace != state.claim_namespace {
                state.claim_namespace = namespace;
                state.claim_name = None;
                derive_modes(&mut state);
            }
        }
        DiskFormEvent::SetClaimName(name) => {
            state.claim_name = name;
            prefill_size_from_claim(&mut state);
            derive_modes(&mut state);
        }
        DiskFormEvent::SetSize(size) => state.size = size,
        DiskFormEvent::SetUnit(unit) => state.unit = unit,
        DiskFormEvent::SetStorageClass(class) => {
            state.storage_class = class;
            derive_modes(&mut state);
        }
        DiskFormEvent::SetAccessMode(mode) => state.access_mode = mode,
        DiskFormEvent::SetVolumeMode(mode) => {
            if let Some(claim_mode) = state.claim_volume_mode() {
                debug!(volume_mode = %claim_mode, "volume mode is set by the source claim");
            } else {
                state.volume_mode = mode;
            }
        }
        DiskFormEvent::SetPreallocation(enabled) => {
            if state.rules().supports_preallocation {
                state.preallocation = enabled;
            } else {
                debug!(source = %state.source, "preallocation not available for source");
            }
        }
        DiskFormEvent::StorageClassesLoaded(classes) => {
            state.storage_classes = classes;
            preselect_default_storage_class(&mut state);
        }
        DiskFormEvent::ClaimsLoaded(claims) => {
            state.claims = claims;
            prefill_size_from_claim(&mut state);
            derive_modes(&mut state);
        }
        DiskFormEvent::DefaultsLoaded(defaults) => {
            state.defaults = defaults;
            derive_modes(&mut state);
        }
        DiskFormEvent::SubmitStarted => {
            if state.is_editable() {
                state.phase = FormPhase::Submitting;
            }
        }
        DiskFormEvent::SubmitFailed(message) => {
            if state.phase == FormPhase::Submitting {
                state.phase = FormPhase::Failed(message);
            }
        }
        DiskFormEvent::SubmitSucceeded => {
            if state.phase == FormPhase::Submitting {
                state.phase = FormPhase::Submitted;
            }
        }
    }
    state
}

fn switch_source(state: &mut DiskFormState, source: DiskSource) {
    debug!(from = %state.source, to = %source, "switching disk source");
    state.source = source;
    state.url.clear();
    state.image.clear();
    state.claim_namespace = None;
    state.claim_name = None;
    state.size = state.config.initial_size();
    state.unit = state.config.default_unit;
    state.storage_class = None;
    state.access_mode = None;
    state.volume_mode = None;
    state.derived_access_mode = None;
    state.derived_volume_mode = None;
    state.preallocation = false;
    derive_modes(state);
}

/// Re-derives access and volume mode, then lets the source claim override
/// the volume mode.
fn derive_modes(state: &mut DiskFormState) {
    derive_storage_class_modes(state);
    match state.claim_volume_mode() {
        Some(mode) => {
            state.volume_mode = Some(mode);
            state.derived_volume_mode = Some(mode);
        }
        None if !state.rules().uses_storage_class => {
            state.volume_mode = None;
            state.derived_volume_mode = None;
        }
        None => {}
    }
}

/// Re-derives access and volume mode for the selected storage class.
///
/// A mode is overwritten only while it is unset or still equal to the
/// default derived last time.
fn derive_storage_class_modes(state: &mut DiskFormState) {
    if !state.rules().uses_storage_class {
        return;
    }
    let Some(defaults) = state.defaults.loaded() else {
        return;
    };
    let class = state.storage_class.as_deref();
    let access_mode = defaults.access_mode(class);
    let volume_mode = defaults.volume_mode(class);

    if state.access_mode.is_none() || state.access_mode == state.derived_access_mode {
        state.access_mode = access_mode;
    } else {
        debug!(access_mode = ?state.access_mode, "keeping user access mode");
    }
    state.derived_access_mode = access_mode;

    if state.volume_mode.is_none() || state.volume_mode == state.derived_volume_mode {
        state.volume_mode = volume_mode;
    } else {
        debug!(volume_mode = ?state.volume_mode, "keeping user volume mode");
    }
    state.derived_volume_mode = volume_mode;
}

fn preselect_default_storage_class(state: &mut DiskFormState) {
    if !state.config.preselect_default_storage_class
        || state.storage_class.is_some()
        || !state.rules().uses_storage_class
    {
        return;
    }
    let default = state
        .storage_classes
        .loaded()
        .and_then(|classes| classes.iter().find(|c| c.is_default))
        .map(|c| c.name.clone());
    if let Some(name) = default {
        debug!(storage_class = %name, "pre-selecting default storage class");
        state.storage_class = Some(name);
        derive_modes(state);
    }
}

/// A cloned disk starts at the size of its source claim.
fn prefill_size_from_claim(state: &mut DiskFormState) {
    if state.source != DiskSource::ClonePvc
        || (!state.size.trim().is_empty() && state.size != state.config.initial_size())
    {
        return;
    }
    let Some(bytes) = state.selected_claim().and_then(|c| c.size_bytes) else {
        return;
    };
    let (size, unit) = SizeUnit::fit(bytes);
    state.size = size.to_string();
    state.unit = unit;
}
