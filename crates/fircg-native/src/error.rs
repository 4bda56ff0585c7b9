use fircg_layout::LowerError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while building a native signature.
#[derive(Error, Diagnostic, Debug, Clone, PartialEq, Eq)]
pub enum NativeError {
    #[error("Slot `{slot}` has no Cranelift type: {reason}")]
    #[diagnostic(code("NATIVE-SLOT-001"))]
    UnsupportedSlot { slot: String, reason: String },

    #[error("Type lowering failed: {0}")]
    #[diagnostic(code("NATIVE-LOWER-001"))]
    Lower(#[from] LowerError),
}

pub type NativeResult<T> = Result<T, NativeError>;
