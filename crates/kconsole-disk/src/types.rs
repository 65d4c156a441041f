//! Disk vocabulary.
//!
//! - [`DiskType`]: how the disk is presented to the guest
//! - [`DiskBus`]: the interface it is attached through
//! - [`DiskSource`]: where its data comes from, with the static
//!   [`SourceRules`] table deciding which fields apply
//! - [`SizeUnit`], [`AccessMode`], [`VolumeMode`]: storage request fields

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How a disk is presented to the guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskType {
    /// A regular disk.
    #[default]
    Disk,
    /// A CD-ROM drive.
    Cdrom,
    /// A LUN passed through from a claim.
    Lun,
}

impl DiskType {
    /// All disk types.
    pub const ALL: [Self; 3] = [Self::Disk, Self::Cdrom, Self::Lun];

    /// Buses this type can be attached through.
    #[must_use]
    pub const fn buses(self) -> &'static [DiskBus] {
        match self {
            Self::Disk => &[DiskBus::Virtio, DiskBus::Sata, DiskBus::Scsi],
            Self::Cdrom | Self::Lun => &[DiskBus::Sata, DiskBus::Scsi],
        }
    }

    /// Bus picked when the type is chosen.
    #[must_use]
    pub const fn default_bus(self) -> DiskBus {
        match self {
            Self::Disk => DiskBus::Virtio,
            Self::Cdrom => DiskBus::Sata,
            Self::Lun => DiskBus::Scsi,
        }
    }

    /// Whether `bus` is supported.
    #[must_use]
    pub fn supports_bus(self, bus: DiskBus) -> bool {
        self.buses().contains(&bus)
    }

    /// Sources this type can be backed by.
    #[must_use]
    pub const fn sources(self) -> &'static [DiskSource] {
        match self {
            Self::Disk => &DiskSource::ALL,
            Self::Cdrom => &[
                DiskSource::Url,
                DiskSource::Registry,
                DiskSource::Container,
                DiskSource::ClonePvc,
                DiskSource::AttachPvc,
            ],
            Self::Lun => &[DiskSource::AttachPvc, DiskSource::ClonePvc],
        }
    }

    /// Whether `source` is supported.
    #[must_use]
    pub fn supports_source(self, source: DiskSource) -> bool {
        self.sources().contains(&source)
    }

    /// Source picked when the current one is incompatible with this type.
    #[must_use]
    pub const fn default_source(self) -> DiskSource {
        match self {
            Self::Disk => DiskSource::Blank,
            Self::Cdrom => DiskSource::Url,
            Self::Lun => DiskSource::AttachPvc,
        }
    }

    /// The KubeVirt device key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disk => "disk",
            Self::Cdrom => "cdrom",
            Self::Lun => "lun",
        }
    }
}

impl fmt::Display for DiskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interface a disk is attached through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiskBus {
    /// Paravirtualized `VirtIO`.
    Virtio,
    /// SATA.
    Sata,
    /// SCSI.
    Scsi,
}

impl DiskBus {
    /// The KubeVirt bus name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Virtio => "virtio",
            Self::Sata => "sata",
            Self::Scsi => "scsi",
        }
    }
}

impl fmt::Display for DiskBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a disk's data comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiskSource {
    /// A new empty volume.
    #[default]
    Blank,
    /// Imported over HTTP(S).
    Url,
    /// Imported from a container registry into a new volume.
    Registry,
    /// An ephemeral container disk.
    Container,
    /// A clone of an existing claim.
    ClonePvc,
    /// An existing claim, attached as is.
    AttachPvc,
    /// A new claim provisioned by the storage class.
    NewPvc,
}

impl DiskSource {
    /// All sources, in display order.
    pub const ALL: [Self; 7] = [
        Self::Blank,
        Self::Url,
        Self::Registry,
        Self::Container,
        Self::ClonePvc,
        Self::AttachPvc,
        Self::NewPvc,
    ];

    /// Field requirements and payloads of this source.
    #[must_use]
    pub const fn rules(self) -> SourceRules {
        let none = SourceRules {
            requires_size: false,
            requires_url: false,
            requires_image: false,
            requires_claim: false,
            requires_claim_namespace: false,
            creates_data_volume: false,
            creates_claim: false,
            uses_storage_class: false,
            supports_preallocation: false,
        };
        match self {
            Self::Blank => SourceRules {
                requires_size: true,
                creates_data_volume: true,
                uses_storage_class: true,
                supports_preallocation: true,
                ..none
            },
            Self::Url => SourceRules {
                requires_size: true,
                requires_url: true,
                creates_data_volume: true,
                uses_storage_class: true,
                ..none
            },
            Self::Registry => SourceRules {
                requires_size: true,
                requires_image: true,
                creates_data_volume: true,
                uses_storage_class: true,
                ..none
            },
            Self::Container => SourceRules {
                requires_image: true,
                ..none
            },
            Self::ClonePvc => SourceRules {
                requires_size: true,
                requires_claim: true,
                requires_claim_namespace: true,
                creates_data_volume: true,
                uses_storage_class: true,
                ..none
            },
            Self::AttachPvc => SourceRules {
                requires_claim: true,
                ..none
            },
            Self::NewPvc => SourceRules {
                requires_size: true,
                creates_claim: true,
                uses_storage_class: true,
                ..none
            },
        }
    }

    /// Stable name of the source.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Blank => "blank",
            Self::Url => "url",
            Self::Registry => "registry",
            Self::Container => "container",
            Self::ClonePvc => "clone-pvc",
            Self::AttachPvc => "attach-pvc",
            Self::NewPvc => "new-pvc",
        }
    }
}

impl fmt::Display for DiskSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which fields a [`DiskSource`] needs and which payloads it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct SourceRules {
    /// Size and unit are required.
    pub requires_size: bool,
    /// An import URL is required.
    pub requires_url: bool,
    /// A container image is required.
    pub requires_image: bool,
    /// An existing claim name is required.
    pub requires_claim: bool,
    /// The namespace of the existing claim is required.
    pub requires_claim_namespace: bool,
    /// A `DataVolume` is created.
    pub creates_data_volume: bool,
    /// A new `PersistentVolumeClaim` is created.
    pub creates_claim: bool,
    /// Storage class, access mode and volume mode apply.
    pub uses_storage_class: bool,
    /// The created disk can be preallocated.
    pub supports_preallocation: bool,
}

/// Binary size unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeUnit {
    /// Mebibytes.
    Mi,
    /// Gibibytes.
    #[default]
    Gi,
    /// Tebibytes.
    Ti,
}

impl SizeUnit {
    /// Bytes per unit.
    #[must_use]
    pub const fn bytes(self) -> u64 {
        match self {
            Self::Mi => 1 << 20,
            Self::Gi => 1 << 30,
            Self::Ti => 1 << 40,
        }
    }

    /// The largest unit that represents `bytes` exactly, rounding up to
    /// whole mebibytes otherwise.
    #[must_use]
    pub const fn fit(bytes: u64) -> (u64, Self) {
        if bytes >= Self::Ti.bytes() && bytes % Self::Ti.bytes() == 0 {
            (bytes / Self::Ti.bytes(), Self::Ti)
        } else if bytes >= Self::Gi.bytes() && bytes % Self::Gi.bytes() == 0 {
            (bytes / Self::Gi.bytes(), Self::Gi)
        } else {
            (bytes.div_ceil(Self::Mi.bytes()), Self::Mi)
        }
    }

    /// Quantity suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mi => "Mi",
            Self::Gi => "Gi",
            Self::Ti => "Ti",
        }
    }

    /// Parses a storage quantity such as `30Gi` or `1536Mi` into bytes.
    ///
    /// Plain integers are bytes. Decimal suffixes and fractions are rejected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownValue`] for anything else, including quantities
    /// that overflow.
    pub fn parse_quantity(quantity: &str) -> Result<u64, Error> {
        let quantity = quantity.trim();
        let invalid = || Error::UnknownValue {
            field: "quantity",
            value: quantity.to_string(),
        };
        let split = quantity
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(quantity.len());
        let (digits, suffix) = quantity.split_at(split);
        let value = digits.parse::<u64>().map_err(|_| invalid())?;
        if suffix.is_empty() {
            return Ok(value);
        }
        let unit = suffix.parse::<Self>().map_err(|_| invalid())?;
        value.checked_mul(unit.bytes()).ok_or_else(invalid)
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SizeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Mi" => Ok(Self::Mi),
            "Gi" => Ok(Self::Gi),
            "Ti" => Ok(Self::Ti),
            other => Err(Error::UnknownValue {
                field: "sizeUnit",
                value: other.to_string(),
            }),
        }
    }
}

/// Access mode of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccessMode {
    /// Read-write by a single node.
    ReadWriteOnce,
    /// Read-write by many nodes.
    ReadWriteMany,
    /// Read-only by many nodes.
    ReadOnlyMany,
}

impl AccessMode {
    /// The Kubernetes name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ReadWriteOnce => "ReadWriteOnce",
            Self::ReadWriteMany => "ReadWriteMany",
            Self::ReadOnlyMany => "ReadOnlyMany",
        }
    }
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccessMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ReadWriteOnce" => Ok(Self::ReadWriteOnce),
            "ReadWriteMany" => Ok(Self::ReadWriteMany),
            "ReadOnlyMany" => Ok(Self::ReadOnlyMany),
            other => Err(Error::UnknownValue {
                field: "accessMode",
                value: other.to_string(),
            }),
        }
    }
}

/// Volume mode of a claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VolumeMode {
    /// Mounted as a filesystem.
    Filesystem,
    /// Raw block device.
    Block,
}

impl VolumeMode {
    /// The Kubernetes name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Filesystem => "Filesystem",
            Self::Block => "Block",
        }
    }
}

impl fmt::Display for VolumeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Filesystem" => Ok(Self::Filesystem),
            "Block" => Ok(Self::Block),
            other => Err(Error::UnknownValue {
                field: "volumeMode",
                value: other.to_string(),
            }),
        }
    }
}
