#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fairval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod backup;
pub mod document;
pub mod error;
pub mod legacy;
pub mod source;
pub mod store;

pub use backup::BackupPolicy;
pub use document::{EffectiveValue, LastUpdated, SourceMaps, StoreDocument};
pub use error::{Result, StoreError};
pub use legacy::LegacyImport;
pub use source::{FairValueSource, PriorityOrder};
pub use store::{FairValueStore, StoreOptions};

/// Current document format version.
pub const FORMAT_VERSION: u32 = 1;

/// File name used for the store document.
pub const DEFAULT_FILE_NAME: &str = "fair_values_config.json";
