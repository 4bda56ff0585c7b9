//! Type universes shared by the code generator crates.
//!
//! [`SourceType`] is the target-independent input, [`PhysicalType`] the
//! target-specific output, and [`KindMapping`] resolves scalar kinds to
//! widths and floating-point formats.

pub mod error;
pub mod kind;
pub mod physical;
pub mod source;

pub use error::{TypeError, TypeResult};
pub use kind::{DefaultKinds, FloatClass, KindCategory, KindMapping, KindTy};
pub use physical::{IdentifiedStruct, PhysicalType, StructBody, StructType};
pub use source::{
    BoxType, CharLen, Extent, FunctionType, PointerKind, Rank, RecordType, SequenceType, Shape,
    SourceType,
};
