use fircg_target::AbiError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors that can occur while lowering a type.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum LowerError {
    #[error("Unsupported construct: {0}")]
    #[diagnostic(code("LOWER-UNSUPPORTED-001"))]
    UnsupportedConstruct(String),

    #[error("Not yet implemented: {0}")]
    #[diagnostic(
        code("LOWER-EXTENSION-001"),
        help("This construct has no physical layout yet and cannot be lowered")
    )]
    UnimplementedExtension(String),

    #[error("Record `{0}` was declared but never given a body")]
    #[diagnostic(code("LOWER-RECORD-001"))]
    IncompleteRecord(String),
}

impl From<AbiError> for LowerError {
    fn from(err: AbiError) -> Self {
        match err {
            AbiError::UnsupportedConstruct { construct, target } => {
                LowerError::UnsupportedConstruct(format!("{} on target `{}`", construct, target))
            }
        }
    }
}

/// Result type for lowering operations.
pub type LowerResult<T> = Result<T, LowerError>;
