//! Target selection and the ABI catalog.
//!
//! A compilation builds exactly one [`AbiCatalog`] from its target triple.
//! Unsupported triples fail here, before any type is converted.

pub mod catalog;
pub mod config;
pub mod error;
pub mod marshal;
pub mod triple;

pub use catalog::AbiCatalog;
pub use config::TargetConfig;
pub use error::{AbiError, AbiResult, TargetError, TargetResult};
pub use marshal::{Attributes, Marshalling};
pub use triple::{determine_target_triple, parse_triple, TargetAbi, DEFAULT_TRIPLE};
