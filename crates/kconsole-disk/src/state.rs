//! Form state and the events that change it.

use std::collections::BTreeSet;

use kconsole_core::Namespace;
use serde::{Deserialize, Serialize};

use crate::config::DiskFormConfig;
use crate::reference::{ClaimRef, Reference, StorageClassDefaults, StorageClassRef};
use crate::types::{AccessMode, DiskBus, DiskSource, DiskType, SizeUnit, SourceRules, VolumeMode};

/// Where the form is in its submit lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormPhase {
    /// Accepting input.
    #[default]
    Editing,
    /// Waiting for the submit call; inputs are disabled.
    Submitting,
    /// The last submit was rejected; inputs are enabled again.
    Failed(String),
    /// Submitted; the modal closes.
    Submitted,
}

impl FormPhase {
    /// Whether inputs are enabled.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        matches!(self, Self::Editing | Self::Failed(_))
    }

    /// Error of the last rejected submit.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message.as_str()),
            _ => None,
        }
    }
}

/// Everything the add-disk modal knows.
///
/// Only [`reduce`](crate::reduce) produces new states; every derived field is
/// a function of the previous state and one [`DiskFormEvent`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskFormState {
    /// Virtual machine the disk is added to.
    pub vm_name: String,
    /// Namespace of the virtual machine.
    pub namespace: Namespace,
    /// Session configuration.
    pub config: DiskFormConfig,

    /// Disk name.
    pub name: String,
    /// Selected source.
    pub source: DiskSource,
    /// Selected disk type.
    pub disk_type: DiskType,
    /// Selected bus.
    pub bus: DiskBus,
    /// Import URL.
    pub url: String,
    /// Container image.
    pub image: String,
    /// Namespace of the claim to clone.
    pub claim_namespace: Option<Namespace>,
    /// Claim to clone or attach.
    pub claim_name: Option<String>,
    /// Size as typed.
    pub size: String,
    /// Size unit.
    pub unit: SizeUnit,
    /// Selected storage class; `None` uses the cluster default.
    pub storage_class: Option<String>,
    /// Selected access mode.
    pub access_mode: Option<AccessMode>,
    /// Selected volume mode.
    pub volume_mode: Option<VolumeMode>,
    /// Access mode last derived from the storage class defaults.
    pub derived_access_mode: Option<AccessMode>,
    /// Volume mode last derived from the storage class defaults.
    pub derived_volume_mode: Option<VolumeMode>,
    /// Preallocate the blank disk.
    pub preallocation: bool,

    /// Disk names already used by the virtual machine.
    pub used_disk_names: BTreeSet<String>,
    /// Claims already attached to the virtual machine.
    pub used_claim_names: BTreeSet<String>,

    /// Storage classes.
    pub storage_classes: Reference<Vec<StorageClassRef>>,
    /// Existing claims.
    pub claims: Reference<Vec<ClaimRef>>,
    /// Storage class defaults table.
    pub defaults: Reference<StorageClassDefaults>,

    /// Submit lifecycle.
    pub phase: FormPhase,
}

impl DiskFormState {
    /// A fresh form for a disk on `vm_name`.
    #[must_use]
    pub fn new(vm_name: impl Into<String>, namespace: Namespace, config: DiskFormConfig) -> Self {
        let disk_type = DiskType::default();
        Self {
            vm_name: vm_name.into(),
            namespace,
            name: next_free_name(&BTreeSet::new()),
            source: DiskSource::default(),
            disk_type,
            bus: disk_type.default_bus(),
            url: String::new(),
            image: String::new(),
            claim_namespace: None,
            claim_name: None,
            size: config.initial_size(),
            unit: config.default_unit,
            storage_class: None,
            access_mode: None,
            volume_mode: None,
            derived_access_mode: None,
            derived_volume_mode: None,
            preallocation: false,
            used_disk_names: BTreeSet::new(),
            used_claim_names: BTreeSet::new(),
            storage_classes: Reference::Loading,
            claims: Reference::Loading,
            defaults: Reference::Loading,
            phase: FormPhase::Editing,
            config,
        }
    }

    /// Record the virtual machine's existing disks and suggest the next free
    /// name.
    #[must_use]
    pub fn with_used_disk_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.used_disk_names = names.into_iter().map(Into::into).collect();
        self.name = next_free_name(&self.used_disk_names);
        self
    }

    /// Record the claims already attached to the virtual machine.
    #[must_use]
    pub fn with_used_claim_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.used_claim_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// Field rules of the selected source.
    #[must_use]
    pub const fn rules(&self) -> SourceRules {
        self.source.rules()
    }

    /// Whether inputs are enabled.
    #[must_use]
    pub const fn is_editable(&self) -> bool {
        self.phase.is_editable()
    }

    /// The requested size in bytes, if the size parses and fits.
    #[must_use]
    pub fn size_bytes(&self) -> Option<u64> {
        self.size
            .trim()
            .parse::<u64>()
            .ok()?
            .checked_mul(self.unit.bytes())
    }

    /// Namespace the claim is looked up in.
    #[must_use]
    pub fn claim_lookup_namespace(&self) -> Option<&Namespace> {
        if self.rules().requires_claim_namespace {
            self.claim_namespace.as_ref()
        } else {
            Some(&self.namespace)
        }
    }

    /// The selected claim, once claims are loaded.
    #[must_use]
    pub fn selected_claim(&self) -> Option<&ClaimRef> {
        let name = self.claim_name.as_deref()?;
        let namespace = self.claim_lookup_namespace()?;
        self.claims
            .loaded()?
            .iter()
            .find(|c| c.name == name && &c.namespace == namespace)
    }

    /// Volume mode dictated by the selected claim.
    ///
    /// Claim-backed sources keep the volume mode of their claim; the user
    /// cannot pick another one while this is `Some`.
    #[must_use]
    pub fn claim_volume_mode(&self) -> Option<VolumeMode> {
        if !self.rules().requires_claim {
            return None;
        }
        self.selected_claim()?.volume_mode
    }

    /// The selected storage class, once storage classes are loaded.
    #[must_use]
    pub fn selected_storage_class(&self) -> Option<&StorageClassRef> {
        let name = self.storage_class.as_deref()?;
        self.storage_classes
            .loaded()?
            .iter()
            .find(|c| c.name == name)
    }

    /// Name of the `DataVolume` or claim created for this disk.
    #[must_use]
    pub fn volume_resource_name(&self) -> String {
        format!("{}-{}", self.vm_name, self.name)
    }
}

fn next_free_name(used: &BTreeSet<String>) -> String {
    (0..=used.len())
        .map(|i| format!("disk-{i}"))
        .find(|name| !used.contains(name))
        .unwrap_or_default()
}

/// A single change to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskFormEvent {
    /// Disk name typed.
    SetName(String),
    /// Source chosen.
    SetSource(DiskSource),
    /// Disk type chosen.
    SetDiskType(DiskType),
    /// Bus chosen.
    SetBus(DiskBus),
    /// URL typed.
    SetUrl(String),
    /// Container image typed.
    SetImage(String),
    /// Namespace of the claim to clone chosen.
    SetClaimNamespace(Option<Namespace>),
    /// Claim chosen.
    SetClaimName(Option<String>),
    /// Size typed.
    SetSize(String),
    /// Unit chosen.
    SetUnit(SizeUnit),
    /// Storage class chosen.
    SetStorageClass(Option<String>),
    /// Access mode chosen.
    SetAccessMode(Option<AccessMode>),
    /// Volume mode chosen.
    SetVolumeMode(Option<VolumeMode>),
    /// Preallocation toggled.
    SetPreallocation(bool),
    /// Storage classes arrived.
    StorageClassesLoaded(Reference<Vec<StorageClassRef>>),
    /// Claims arrived.
    ClaimsLoaded(Reference<Vec<ClaimRef>>),
    /// Storage class defaults arrived.
    DefaultsLoaded(Reference<StorageClassDefaults>),
    /// The submit call started.
    SubmitStarted,
    /// The submit call was rejected.
    SubmitFailed(String),
    /// The submit call succeeded.
    SubmitSucceeded,
}

impl DiskFormEvent {
    /// Whether this is user input, ignored while inputs are disabled.
    #[must_use]
    pub const fn is_edit(&self) -> bool {
        !matches!(
            self,
            Self::StorageClassesLoaded(_)
                | Self::ClaimsLoaded(_)
                | Self::DefaultsLoaded(_)
                | Self::SubmitStarted
                | Self::SubmitFailed(_)
                | Self::SubmitSucceeded
        )
    }
}
