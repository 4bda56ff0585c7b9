use miette::Diagnostic;
use thiserror::Error;

/// Errors raised while building or configuring the type universes.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("Kind map entry `{entry}` is malformed")]
    #[diagnostic(
        code("KIND-PARSE-001"),
        help("Entries look like `i10:80` or `r16:FP128`, separated by commas")
    )]
    MalformedKindEntry { entry: String },

    #[error("Kind map entry `{entry}` uses unknown category `{letter}`")]
    #[diagnostic(
        code("KIND-PARSE-002"),
        help("Valid categories are `a` (character), `c` (complex), `i` (integer), `l` (logical) and `r` (real)")
    )]
    UnknownKindCategory { entry: String, letter: char },

    #[error("Kind map entry `{entry}` has an invalid kind value")]
    #[diagnostic(code("KIND-PARSE-003"))]
    InvalidKindValue { entry: String },

    #[error("Kind map entry `{entry}` has an invalid bit width")]
    #[diagnostic(code("KIND-PARSE-004"), help("Bit widths must be positive integers"))]
    InvalidBitWidth { entry: String },

    #[error("Kind map entry `{entry}` names unknown floating-point format `{name}`")]
    #[diagnostic(
        code("KIND-PARSE-005"),
        help("Known formats: Half, BFloat, Float, Double, X86_FP80, FP128, PPC_FP128")
    )]
    UnknownFloatFormat { entry: String, name: String },

    #[error("Record `{0}` already has a body")]
    #[diagnostic(code("TYPE-RECORD-001"))]
    RecordRedefined(String),
}

/// Result type for type-universe operations.
pub type TypeResult<T> = Result<T, TypeError>;
