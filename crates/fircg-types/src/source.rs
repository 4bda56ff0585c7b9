//! The target-independent type universe handed to code generation.

use crate::error::{TypeError, TypeResult};
use crate::kind::KindTy;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, OnceLock};

/// One dimension of a sequence shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Extent {
    Known(u64),
    Unknown,
}

impl Extent {
    pub fn is_known(self) -> bool {
        matches!(self, Extent::Known(_))
    }
}

impl From<u64> for Extent {
    fn from(value: u64) -> Self {
        Extent::Known(value)
    }
}

/// Ordered extents of a sequence. An empty list means the rank itself is
/// not known (assumed rank).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<Extent>);

impl Shape {
    pub fn new(extents: Vec<Extent>) -> Self {
        Shape(extents)
    }

    /// Shape of an assumed-rank entity.
    pub fn assumed_rank() -> Self {
        Shape(Vec::new())
    }

    pub fn extents(&self) -> &[Extent] {
        &self.0
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn is_unknown(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of leading dimensions with a known extent.
    pub fn constant_rows(&self) -> usize {
        self.0.iter().take_while(|e| e.is_known()).count()
    }
}

impl From<Vec<Extent>> for Shape {
    fn from(extents: Vec<Extent>) -> Self {
        Shape(extents)
    }
}

/// Length of a character entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharLen {
    Known(u64),
    Unknown,
}

/// Rank of a descriptor. `Unknown` is distinct from rank 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    Known(u32),
    Unknown,
}

/// The three flavours of memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerKind {
    Reference,
    Pointer,
    Heap,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SequenceType {
    pub shape: Shape,
    pub element: Arc<SourceType>,
}

impl SequenceType {
    pub fn dimension(&self) -> usize {
        self.shape.dimension()
    }

    pub fn constant_rows(&self) -> usize {
        self.shape.constant_rows()
    }

    pub fn has_unknown_shape(&self) -> bool {
        self.shape.is_unknown()
    }

    /// True iff the shape exists and every extent is known.
    pub fn has_constant_shape(&self) -> bool {
        !self.shape.is_unknown() && self.constant_rows() == self.dimension()
    }

    /// True when everything after the leading constant rows is unknown, so
    /// the sequence can degenerate to a pointer to its constant interior.
    pub fn has_constant_interior(&self) -> bool {
        if self.has_unknown_shape() {
            return true;
        }
        self.shape.extents()[self.constant_rows()..]
            .iter()
            .all(|e| !e.is_known())
    }
}

/// Boxed descriptor (fat pointer) type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoxType {
    pub element: Arc<SourceType>,
    pub declared_rank: Option<Rank>,
    /// Polymorphic entities need the extended descriptor layout.
    pub polymorphic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct FunctionType {
    pub inputs: Vec<SourceType>,
    pub results: Vec<SourceType>,
}

impl FunctionType {
    pub fn new(inputs: Vec<SourceType>, results: Vec<SourceType>) -> Self {
        FunctionType { inputs, results }
    }
}

/// A named derived type. Records are uniquely named, so identity is the
/// name. The field list may be supplied after the record is created, which
/// is how self- and mutually-referential records are built.
pub struct RecordType {
    name: String,
    len_params: Vec<(String, SourceType)>,
    fields: OnceLock<Vec<(String, SourceType)>>,
}

impl RecordType {
    /// Forward declaration without a body.
    pub fn declare(name: impl Into<String>) -> Arc<Self> {
        Arc::new(RecordType {
            name: name.into(),
            len_params: Vec::new(),
            fields: OnceLock::new(),
        })
    }

    /// Forward declaration of a record with length type parameters.
    pub fn declare_with_len_params(
        name: impl Into<String>,
        len_params: Vec<(String, SourceType)>,
    ) -> Arc<Self> {
        Arc::new(RecordType {
            name: name.into(),
            len_params,
            fields: OnceLock::new(),
        })
    }

    pub fn with_fields(name: impl Into<String>, fields: Vec<(String, SourceType)>) -> Arc<Self> {
        let record = Self::declare(name);
        let _ = record.fields.set(fields);
        record
    }

    /// Supplies the body of a forward-declared record.
    pub fn finalize(&self, fields: Vec<(String, SourceType)>) -> TypeResult<()> {
        self.fields
            .set(fields)
            .map_err(|_| TypeError::RecordRedefined(self.name.clone()))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> Option<&[(String, SourceType)]> {
        self.fields.get().map(Vec::as_slice)
    }

    pub fn len_params(&self) -> &[(String, SourceType)] {
        &self.len_params
    }

    pub fn is_finalized(&self) -> bool {
        self.fields.get().is_some()
    }
}

impl PartialEq for RecordType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for RecordType {}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

// Fields may refer back to this record, so only the name is printed.
impl fmt::Debug for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordType")
            .field("name", &self.name)
            .field("finalized", &self.is_finalized())
            .finish()
    }
}

/// Target-independent type, as produced by semantic analysis.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceType {
    Box(BoxType),
    /// Boxed character: a (buffer address, length) pair.
    BoxChar { kind: KindTy },
    BoxProc(Arc<FunctionType>),
    Character { kind: KindTy, len: CharLen },
    Complex(KindTy),
    Record(Arc<RecordType>),
    Logical(KindTy),
    Integer(KindTy),
    Real(KindTy),
    PointerLike { kind: PointerKind, pointee: Arc<SourceType> },
    Sequence(SequenceType),
    Vector { element: Arc<SourceType>, len: u64 },
    Tuple(Vec<SourceType>),
    Function(Arc<FunctionType>),
    /// Field index marker.
    Field,
    /// Length parameter marker.
    Len,
    /// Type descriptor of the given type.
    TypeDesc(Arc<SourceType>),
    /// The unit type.
    None,
}

impl SourceType {
    pub fn integer(kind: KindTy) -> Self {
        SourceType::Integer(kind)
    }

    pub fn real(kind: KindTy) -> Self {
        SourceType::Real(kind)
    }

    pub fn logical(kind: KindTy) -> Self {
        SourceType::Logical(kind)
    }

    pub fn complex(kind: KindTy) -> Self {
        SourceType::Complex(kind)
    }

    pub fn character(kind: KindTy, len: u64) -> Self {
        SourceType::Character { kind, len: CharLen::Known(len) }
    }

    pub fn dynamic_character(kind: KindTy) -> Self {
        SourceType::Character { kind, len: CharLen::Unknown }
    }

    pub fn reference(pointee: SourceType) -> Self {
        SourceType::PointerLike { kind: PointerKind::Reference, pointee: Arc::new(pointee) }
    }

    pub fn pointer(pointee: SourceType) -> Self {
        SourceType::PointerLike { kind: PointerKind::Pointer, pointee: Arc::new(pointee) }
    }

    pub fn heap(pointee: SourceType) -> Self {
        SourceType::PointerLike { kind: PointerKind::Heap, pointee: Arc::new(pointee) }
    }

    pub fn sequence(shape: impl Into<Shape>, element: SourceType) -> Self {
        SourceType::Sequence(SequenceType {
            shape: shape.into(),
            element: Arc::new(element),
        })
    }

    pub fn boxed(element: SourceType) -> Self {
        SourceType::Box(BoxType {
            element: Arc::new(element),
            declared_rank: None,
            polymorphic: false,
        })
    }

    pub fn boxed_with_rank(element: SourceType, rank: Rank) -> Self {
        SourceType::Box(BoxType {
            element: Arc::new(element),
            declared_rank: Some(rank),
            polymorphic: false,
        })
    }

    pub fn polymorphic_box(element: SourceType) -> Self {
        SourceType::Box(BoxType {
            element: Arc::new(element),
            declared_rank: None,
            polymorphic: true,
        })
    }

    pub fn record(record: &Arc<RecordType>) -> Self {
        SourceType::Record(Arc::clone(record))
    }

    pub fn vector(element: SourceType, len: u64) -> Self {
        SourceType::Vector { element: Arc::new(element), len }
    }

    pub fn function(inputs: Vec<SourceType>, results: Vec<SourceType>) -> Self {
        SourceType::Function(Arc::new(FunctionType::new(inputs, results)))
    }

    pub fn type_desc(of: SourceType) -> Self {
        SourceType::TypeDesc(Arc::new(of))
    }

    /// Element type behind a reference, pointer or heap type.
    pub fn pointee(&self) -> Option<&SourceType> {
        match self {
            SourceType::PointerLike { pointee, .. } => Some(pointee),
            _ => None,
        }
    }

    /// Character element carried by a boxed character.
    pub fn boxchar_element(kind: KindTy) -> Self {
        SourceType::dynamic_character(kind)
    }

    /// Members of a tuple with nested tuples spliced in place.
    pub fn flattened_members(&self) -> Vec<&SourceType> {
        let mut members = Vec::new();
        flatten_into(self, &mut members);
        members
    }
}

fn flatten_into<'a>(ty: &'a SourceType, out: &mut Vec<&'a SourceType>) {
    match ty {
        SourceType::Tuple(members) => {
            for member in members {
                flatten_into(member, out);
            }
        }
        other => out.push(other),
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, types: &[SourceType]) -> fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", ty)?;
    }
    Ok(())
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        write_list(f, &self.inputs)?;
        f.write_str(") -> (")?;
        write_list(f, &self.results)?;
        f.write_str(")")
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Box(b) if b.polymorphic => write!(f, "class<{}>", b.element),
            SourceType::Box(b) => write!(f, "box<{}>", b.element),
            SourceType::BoxChar { kind } => write!(f, "boxchar<{}>", kind),
            SourceType::BoxProc(sig) => write!(f, "boxproc<{}>", sig),
            SourceType::Character { kind, len } => match len {
                CharLen::Known(1) => write!(f, "char<{}>", kind),
                CharLen::Known(n) => write!(f, "char<{},{}>", kind, n),
                CharLen::Unknown => write!(f, "char<{},?>", kind),
            },
            SourceType::Complex(kind) => write!(f, "complex<{}>", kind),
            SourceType::Record(record) => write!(f, "type<{}>", record.name()),
            SourceType::Logical(kind) => write!(f, "logical<{}>", kind),
            SourceType::Integer(kind) => write!(f, "int<{}>", kind),
            SourceType::Real(kind) => write!(f, "real<{}>", kind),
            SourceType::PointerLike { kind, pointee } => {
                let prefix = match kind {
                    PointerKind::Reference => "ref",
                    PointerKind::Pointer => "ptr",
                    PointerKind::Heap => "heap",
                };
                write!(f, "{}<{}>", prefix, pointee)
            }
            SourceType::Sequence(seq) => {
                f.write_str("array<")?;
                if seq.has_unknown_shape() {
                    f.write_str("*")?;
                } else {
                    for (i, extent) in seq.shape.extents().iter().enumerate() {
                        if i > 0 {
                            f.write_str("x")?;
                        }
                        match extent {
                            Extent::Known(n) => write!(f, "{}", n)?,
                            Extent::Unknown => f.write_str("?")?,
                        }
                    }
                }
                write!(f, ":{}>", seq.element)
            }
            SourceType::Vector { element, len } => write!(f, "vector<{}:{}>", len, element),
            SourceType::Tuple(members) => {
                f.write_str("tuple<")?;
                write_list(f, members)?;
                f.write_str(">")
            }
            SourceType::Function(sig) => write!(f, "{}", sig),
            SourceType::Field => f.write_str("field"),
            SourceType::Len => f.write_str("len"),
            SourceType::TypeDesc(of) => write!(f, "tdesc<{}>", of),
            SourceType::None => f.write_str("none"),
        }
    }
}
