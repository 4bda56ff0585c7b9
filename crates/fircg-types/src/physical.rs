//! Physical types: the concrete representation handed to the final emitter.

use crate::kind::FloatClass;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StructBody {
    pub fields: Vec<PhysicalType>,
    pub packed: bool,
}

impl StructBody {
    pub fn new(fields: Vec<PhysicalType>) -> Self {
        StructBody { fields, packed: false }
    }
}

struct IdentifiedInner {
    name: String,
    body: OnceLock<StructBody>,
}

/// A named struct. Each handle refers to one identity; the body is set once,
/// after the identity already exists, so a struct can contain pointers to
/// itself.
#[derive(Clone)]
pub struct IdentifiedStruct(Arc<IdentifiedInner>);

impl IdentifiedStruct {
    /// New identity with no body yet.
    pub fn opaque(name: impl Into<String>) -> Self {
        IdentifiedStruct(Arc::new(IdentifiedInner {
            name: name.into(),
            body: OnceLock::new(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn body(&self) -> Option<&StructBody> {
        self.0.body.get()
    }

    pub fn is_opaque(&self) -> bool {
        self.0.body.get().is_none()
    }

    /// Sets the body. Hands the body back if one was already set.
    pub fn set_body(&self, body: StructBody) -> Result<(), StructBody> {
        self.0.body.set(body)
    }

    /// True when both handles refer to the same identity.
    pub fn same_identity(&self, other: &IdentifiedStruct) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for IdentifiedStruct {
    fn eq(&self, other: &Self) -> bool {
        self.same_identity(other)
    }
}

impl Eq for IdentifiedStruct {}

impl Hash for IdentifiedStruct {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

impl fmt::Debug for IdentifiedStruct {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StructType {
    /// Unnamed struct, compared structurally.
    Literal(StructBody),
    Identified(IdentifiedStruct),
}

/// Concrete type for a specific target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PhysicalType {
    Integer(u32),
    Float(FloatClass),
    Pointer(Arc<PhysicalType>),
    Array { element: Arc<PhysicalType>, count: u64 },
    Vector { element: Arc<PhysicalType>, count: u64 },
    Struct(StructType),
    Function { params: Vec<PhysicalType>, results: Vec<PhysicalType> },
    /// Untyped byte pointer (`i8*`).
    OpaquePointer,
}

impl PhysicalType {
    pub fn int(width: u32) -> Self {
        PhysicalType::Integer(width)
    }

    pub fn pointer_to(pointee: PhysicalType) -> Self {
        PhysicalType::Pointer(Arc::new(pointee))
    }

    pub fn array_of(element: PhysicalType, count: u64) -> Self {
        PhysicalType::Array { element: Arc::new(element), count }
    }

    pub fn vector_of(element: PhysicalType, count: u64) -> Self {
        PhysicalType::Vector { element: Arc::new(element), count }
    }

    pub fn literal_struct(fields: Vec<PhysicalType>) -> Self {
        PhysicalType::Struct(StructType::Literal(StructBody::new(fields)))
    }

    pub fn empty_struct() -> Self {
        Self::literal_struct(Vec::new())
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, PhysicalType::Pointer(_) | PhysicalType::OpaquePointer)
    }

    pub fn pointee(&self) -> Option<&PhysicalType> {
        match self {
            PhysicalType::Pointer(pointee) => Some(pointee),
            _ => None,
        }
    }

    /// Fields of a literal struct or of an identified struct with a body.
    pub fn struct_fields(&self) -> Option<&[PhysicalType]> {
        match self {
            PhysicalType::Struct(StructType::Literal(body)) => Some(&body.fields),
            PhysicalType::Struct(StructType::Identified(ident)) => {
                ident.body().map(|body| body.fields.as_slice())
            }
            _ => None,
        }
    }

    pub fn as_identified(&self) -> Option<&IdentifiedStruct> {
        match self {
            PhysicalType::Struct(StructType::Identified(ident)) => Some(ident),
            _ => None,
        }
    }

    /// Number of scalar elements in a (possibly nested) fixed array, `None`
    /// if it does not fit in a `u64`.
    pub fn flat_element_count(&self) -> Option<u64> {
        match self {
            PhysicalType::Array { element, count } => count.checked_mul(element.flat_element_count()?),
            _ => Some(1),
        }
    }
}

impl From<IdentifiedStruct> for PhysicalType {
    fn from(ident: IdentifiedStruct) -> Self {
        PhysicalType::Struct(StructType::Identified(ident))
    }
}

fn write_fields(f: &mut fmt::Formatter<'_>, body: &StructBody) -> fmt::Result {
    let (open, close) = if body.packed { ("<{", "}>") } else { ("{", "}") };
    if body.fields.is_empty() {
        return write!(f, "{}{}", open, close);
    }
    write!(f, "{} ", open)?;
    for (i, field) in body.fields.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", field)?;
    }
    write!(f, " {}", close)
}

impl fmt::Display for PhysicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicalType::Integer(width) => write!(f, "i{}", width),
            PhysicalType::Float(class) => write!(f, "{}", class),
            PhysicalType::Pointer(pointee) => write!(f, "{}*", pointee),
            PhysicalType::Array { element, count } => write!(f, "[{} x {}]", count, element),
            PhysicalType::Vector { element, count } => write!(f, "<{} x {}>", count, element),
            PhysicalType::Struct(StructType::Literal(body)) => write_fields(f, body),
            PhysicalType::Struct(StructType::Identified(ident)) => write!(f, "%{}", ident.name()),
            PhysicalType::Function { params, results } => {
                match results.as_slice() {
                    [] => f.write_str("void")?,
                    [single] => write!(f, "{}", single)?,
                    many => write_fields(f, &StructBody::new(many.to_vec()))?,
                }
                f.write_str(" (")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                f.write_str(")")
            }
            PhysicalType::OpaquePointer => f.write_str("i8*"),
        }
    }
}
