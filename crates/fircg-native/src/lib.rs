//! Bridge from lowered signatures to Cranelift.
//!
//! The layout crate decides how every value crosses a call boundary; this
//! crate only renders that decision as a [`cranelift_codegen::ir::Signature`].

pub mod error;
pub mod signature;
pub mod types;

pub use error::{NativeError, NativeResult};
pub use signature::{default_call_conv, native_signature, pointer_type, translate_signature};
pub use types::translate_type;
