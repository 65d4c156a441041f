//! Result payloads handed to the submit call.
//!
//! Four independent, immutable records: the disk, its volume, the optional
//! `DataVolume` and the optional new claim. Disk and volume serialize in the
//! shape of a KubeVirt `VirtualMachine` template entry; the other two render
//! full manifests through `manifest()`.

use kconsole_core::Namespace;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{Error, Result};
use crate::state::DiskFormState;
use crate::types::{AccessMode, DiskBus, DiskSource, DiskType, VolumeMode};
use crate::validation::{DiskField, validate};

/// API version of CDI `DataVolume` objects.
pub const DATA_VOLUME_API_VERSION: &str = "cdi.kubevirt.io/v1beta1";

/// Device and bus of a disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskDevice {
    /// Regular disk.
    Disk {
        /// Bus.
        bus: DiskBus,
    },
    /// CD-ROM.
    Cdrom {
        /// Bus.
        bus: DiskBus,
    },
    /// LUN.
    Lun {
        /// Bus.
        bus: DiskBus,
    },
}

/// A `spec.domain.devices.disks[]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpec {
    /// Disk name; matches the volume name.
    pub name: String,
    /// Device and bus.
    #[serde(flatten)]
    pub device: DiskDevice,
}

impl DiskSpec {
    /// Creates a disk entry.
    #[must_use]
    pub fn new(name: impl Into<String>, disk_type: DiskType, bus: DiskBus) -> Self {
        let device = match disk_type {
            DiskType::Disk => DiskDevice::Disk { bus },
            DiskType::Cdrom => DiskDevice::Cdrom { bus },
            DiskType::Lun => DiskDevice::Lun { bus },
        };
        Self {
            name: name.into(),
            device,
        }
    }
}

/// What backs a volume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VolumeSource {
    /// A `DataVolume` created alongside the disk.
    DataVolume {
        /// `DataVolume` name.
        name: String,
    },
    /// An ephemeral container disk.
    ContainerDisk {
        /// Image reference.
        image: String,
    },
    /// A claim.
    PersistentVolumeClaim {
        /// Claim name.
        #[serde(rename = "claimName")]
        claim_name: String,
    },
}

/// A `spec.volumes[]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeSpec {
    /// Volume name; matches the disk name.
    pub name: String,
    /// Backing source.
    #[serde(flatten)]
    pub source: VolumeSource,
}

/// Storage request shared by `DataVolume`s and claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageRequest {
    /// Quantity such as `10Gi`.
    pub storage: String,
    /// Storage class; `None` uses the cluster default.
    pub storage_class: Option<String>,
    /// Access mode; `None` leaves it to the provisioner.
    pub access_mode: Option<AccessMode>,
    /// Volume mode; `None` leaves it to the provisioner.
    pub volume_mode: Option<VolumeMode>,
}

impl StorageRequest {
    /// Renders a `PersistentVolumeClaimSpec`.
    #[must_use]
    pub fn to_claim_spec(&self) -> Value {
        let mut spec = json!({
            "resources": { "requests": { "storage": self.storage } },
        });
        if let Some(mode) = self.access_mode {
            spec["accessModes"] = json!([mode.as_str()]);
        }
        if let Some(mode) = self.volume_mode {
            spec["volumeMode"] = json!(mode.as_str());
        }
        if let Some(class) = &self.storage_class {
            spec["storageClassName"] = json!(class);
        }
        spec
    }
}

/// Where a `DataVolume` imports from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataVolumeSource {
    /// Empty volume.
    Blank {},
    /// HTTP(S) import.
    Http {
        /// Source URL.
        url: String,
    },
    /// Registry import, `docker://` URL.
    Registry {
        /// Source URL.
        url: String,
    },
    /// Clone of a claim.
    Pvc {
        /// Source claim.
        name: String,
        /// Source namespace.
        namespace: Namespace,
    },
}

/// A CDI `DataVolume` to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataVolumeSpec {
    /// Object name.
    pub name: String,
    /// Object namespace.
    pub namespace: Namespace,
    /// Import source.
    pub source: DataVolumeSource,
    /// Storage request.
    pub storage: StorageRequest,
    /// Preallocate the disk.
    pub preallocation: bool,
}

impl DataVolumeSpec {
    /// The full `DataVolume` manifest.
    ///
    /// `spec.preallocation` is only written when enabled.
    #[must_use]
    pub fn manifest(&self) -> Value {
        let mut manifest = json!({
            "apiVersion": DATA_VOLUME_API_VERSION,
            "kind": "DataVolume",
            "metadata": { "name": self.name, "namespace": self.namespace },
            "spec": {
                "source": self.source,
                "pvc": self.storage.to_claim_spec(),
            },
        });
        if self.preallocation {
            manifest["spec"]["preallocation"] = json!(true);
        }
        manifest
    }
}

/// A `PersistentVolumeClaim` to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSpec {
    /// Object name.
    pub name: String,
    /// Object namespace.
    pub namespace: Namespace,
    /// Storage request.
    pub storage: StorageRequest,
}

impl ClaimSpec {
    /// The full `PersistentVolumeClaim` manifest.
    #[must_use]
    pub fn manifest(&self) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "PersistentVolumeClaim",
            "metadata": { "name": self.name, "namespace": self.namespace },
            "spec": self.storage.to_claim_spec(),
        })
    }
}

/// Everything one submit hands to the persistence call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskResults {
    /// The disk entry.
    pub disk: DiskSpec,
    /// The volume entry.
    pub volume: VolumeSpec,
    /// `DataVolume` to create, for importing and cloning sources.
    pub data_volume: Option<DataVolumeSpec>,
    /// Claim to create, for new claims.
    pub claim: Option<ClaimSpec>,
}

/// Builds the result payloads from a valid form.
///
/// # Errors
///
/// Returns [`Error::InvalidForm`] naming the first failing field if the
/// form does not validate.
pub fn build_results(state: &DiskFormState) -> Result<DiskResults> {
    if let Some((field, reason)) = validate(state).first_error() {
        return Err(Error::InvalidForm { field, reason });
    }

    let storage = || -> Result<StorageRequest> {
        let size = state
            .size
            .trim()
            .parse::<u64>()
            .map_err(|_| missing(DiskField::Size))?;
        Ok(StorageRequest {
            storage: format!("{size}{}", state.unit),
            storage_class: state.storage_class.clone(),
            access_mode: state.access_mode,
            volume_mode: state.volume_mode,
        })
    };
    let claim_name = || state.claim_name.clone().ok_or_else(|| missing(DiskField::ClaimName));
    let resource_name = state.volume_resource_name();
    let data_volume = |source: DataVolumeSource| -> Result<Option<DataVolumeSpec>> {
        Ok(Some(DataVolumeSpec {
            name: resource_name.clone(),
            namespace: state.namespace.clone(),
            source,
            storage: storage()?,
            preallocation: state.preallocation && state.rules().supports_preallocation,
        }))
    };
    let backed_by_data_volume = VolumeSource::DataVolume {
        name: resource_name.clone(),
    };

    let (source, data_volume, claim) = match state.source {
        DiskSource::Blank => (
            backed_by_data_volume,
            data_volume(DataVolumeSource::Blank {})?,
            None,
        ),
        DiskSource::Url => (
            backed_by_data_volume,
            data_volume(DataVolumeSource::Http {
                url: state.url.trim().to_string(),
            })?,
            None,
        ),
        DiskSource::Registry => (
            backed_by_data_volume,
            data_volume(DataVolumeSource::Registry {
                url: format!("docker://{}", state.image.trim()),
            })?,
            None,
        ),
        DiskSource::ClonePvc => {
            let namespace = state
                .claim_namespace
                .clone()
                .ok_or_else(|| missing(DiskField::ClaimNamespace))?;
            (
                backed_by_data_volume,
                data_volume(DataVolumeSource::Pvc {
                    name: claim_name()?,
                    namespace,
                })?,
                None,
            )
        }
        DiskSource::Container => (
            VolumeSource::ContainerDisk {
                image: state.image.trim().to_string(),
            },
            None,
            None,
        ),
        DiskSource::AttachPvc => (
            VolumeSource::PersistentVolumeClaim {
                claim_name: claim_name()?,
            },
            None,
            None,
        ),
        DiskSource::NewPvc => (
            VolumeSource::PersistentVolumeClaim {
                claim_name: resource_name.clone(),
            },
            None,
            Some(ClaimSpec {
                name: resource_name.clone(),
                namespace: state.namespace.clone(),
                storage: storage()?,
            }),
        ),
    };

    debug!(
        disk = %state.name,
        source = %state.source,
        data_volume = data_volume.is_some(),
        claim = claim.is_some(),
        "built disk results"
    );

    Ok(DiskResults {
        disk: DiskSpec::new(state.name.clone(), state.disk_type, state.bus),
        volume: VolumeSpec {
            name: state.name.clone(),
            source,
        },
        data_volume,
        claim,
    })
}

fn missing(field: DiskField) -> Error {
    Error::InvalidForm {
        field,
        reason: "is required".to_string(),
    }
}
