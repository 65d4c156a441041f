//! # kconsole-disk
//!
//! The state engine behind the add-disk modal of the virtual machine pages.
//!
//! A [`DiskFormState`] only changes through [`reduce`], which keeps derived
//! fields (bus, source, size, access and volume modes) consistent with the
//! selected disk type, source and storage class. [`validate`] reports per
//! field status, [`build_results`] turns a valid form into KubeVirt and CDI
//! payloads and [`DiskModalSession`] runs the submit lifecycle.
//!
//! ## Example
//!
//! ```rust
//! use kconsole_core::Namespace;
//! use kconsole_disk::{
//!     DiskFormConfig, DiskFormEvent, DiskFormState, Reference, StorageClassDefaults,
//!     build_results, reduce,
//! };
//!
//! let namespace = Namespace::new("vms").expect("valid namespace");
//! let state = DiskFormState::new("fedora", namespace, DiskFormConfig::default());
//! let state = [
//!     DiskFormEvent::StorageClassesLoaded(Reference::Loaded(vec![])),
//!     DiskFormEvent::ClaimsLoaded(Reference::Loaded(vec![])),
//!     DiskFormEvent::DefaultsLoaded(Reference::Loaded(StorageClassDefaults::new())),
//!     DiskFormEvent::SetSize("10".to_string()),
//! ]
//! .into_iter()
//! .fold(state, reduce);
//!
//! let results = build_results(&state).expect("valid form");
//! assert_eq!(results.volume.name, "disk-0");
//! assert!(results.data_volume.is_some());
//! ```

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod reducer;
pub mod reference;
pub mod results;
pub mod session;
pub mod state;
pub mod types;
pub mod validation;

pub use config::DiskFormConfig;
pub use error::{Error, Result, SubmitError};
pub use reducer::reduce;
pub use reference::{
    ClaimRef, DEFAULT_CLASS_ANNOTATION, Reference, STORAGE_CLASS_DEFAULTS_CONFIG_MAP,
    StorageClassDefaults, StorageClassRef,
};
pub use results::{
    ClaimSpec, DataVolumeSource, DataVolumeSpec, DiskDevice, DiskResults, DiskSpec,
    StorageRequest, VolumeSource, VolumeSpec, build_results,
};
pub use session::{DiskModalSession, DiskSubmitter};
pub use state::{DiskFormEvent, DiskFormState, FormPhase};
pub use types::{AccessMode, DiskBus, DiskSource, DiskType, SizeUnit, SourceRules, VolumeMode};
pub use validation::{DiskField, DiskValidation, FieldStatus, validate};
