use fircg_types::TypeError;
use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while choosing the target. Fatal for the whole compilation.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("Cannot parse target triple `{triple}`: {reason}")]
    #[diagnostic(code("TARGET-TRIPLE-001"))]
    InvalidTriple { triple: String, reason: String },

    #[error("Target `{triple}` is not supported")]
    #[diagnostic(
        code("TARGET-TRIPLE-002"),
        help("Supported targets are i386, x86_64 and aarch64 on Linux or Darwin")
    )]
    UnsupportedTarget { triple: String },

    #[error("Invalid kind map: {0}")]
    #[diagnostic(code("TARGET-KIND-001"))]
    KindMap(#[from] TypeError),
}

/// Errors raised by an ABI query. Reported lazily, on first use of the
/// offending (kind, target) combination.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("No ABI rule for {construct} on target `{target}`")]
    #[diagnostic(code("TARGET-ABI-001"))]
    UnsupportedConstruct { construct: String, target: String },
}

/// Result type for target selection.
pub type TargetResult<T> = Result<T, TargetError>;

/// Result type for ABI queries.
pub type AbiResult<T> = Result<T, AbiError>;
