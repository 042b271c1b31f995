#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fairval/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod batch;
pub mod classifier;
pub mod config;
pub mod error;
pub mod methods;
pub mod registry;
pub mod resolver;
pub mod result;

pub use batch::{BatchOutcome, value_batch};
pub use classifier::{CompanyType, SectorClassifier, SectorTable, SectorTableError};
pub use config::{
    BookValueConfig, ConfigLoadError, DcfConfig, EarningsConfig, PriceToBookPolicy, ValuationConfig,
};
pub use error::{MethodError, NotComputableError};
pub use methods::{
    BookValueValuator, DcfBreakdown, DcfValuator, EarningsValuator, MultipleValuator, Valuator,
};
pub use registry::{
    MethodInfo, available_methods, company_types_using, get_method_info, method_chain, usage_counts,
};
pub use resolver::{ChainRun, FairValueResolver, ResolverState};
pub use result::{Diagnostic, ValuationMethod, ValuationResult};
