#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fairval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod engine;
pub mod universe;

// Re-export main types from sub-crates
pub use fairval_data as data;
pub use fairval_output as output;
pub use fairval_store as store;
pub use fairval_valuation as valuation;

pub use engine::{EngineError, FairValueEngine, ScanReport};
pub use universe::{AexUniverse, GicsSector, TickerList, Universe, UniverseError, load_ticker_file};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
