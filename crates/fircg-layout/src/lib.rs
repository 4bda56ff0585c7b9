use fircg_target::{AbiCatalog, TargetConfig, TargetResult};
use fircg_types::{
    CharLen, FloatClass, FunctionType, IdentifiedStruct, KindMapping, KindTy, PhysicalType,
    SourceType,
};
use rustc_hash::FxHashMap;
use std::sync::Arc;

mod descriptor;
pub mod error;
pub mod helpers;
mod record;
mod sequence;
mod signature;
mod tuple;

pub use descriptor::{DescriptorField, DescriptorFieldModel, DESCRIPTOR_HEADER_FIELDS, DESCRIPTOR_ROW_ENTRIES};
pub use error::{LowerError, LowerResult};
pub use helpers::{has_dynamic_size, is_dynamically_sized};
pub use signature::LoweredSignature;

/// Converts source types to the physical types of one target.
///
/// Record conversions are cached by name so that every record maps to a
/// single struct identity, and so that self-referential records terminate.
/// The cache belongs to this instance: give each code generation thread its
/// own converter. The [`AbiCatalog`] itself is shared freely.
pub struct TypeConverter {
    catalog: Arc<AbiCatalog>,

    /// Widths of the descriptor header and row fields.
    descriptor_model: DescriptorFieldModel,

    /// Record name -> struct identity. An entry exists (without a body) while
    /// the record's fields are being converted.
    ident_struct_cache: FxHashMap<String, IdentifiedStruct>,

    /// Records whose conversion failed, so later lookups fail the same way
    /// instead of handing out the empty identity.
    record_errors: FxHashMap<String, LowerError>,

    /// Names reserved since the outermost record conversion started, in
    /// reservation order. Cleared when that conversion succeeds.
    reserved: Vec<String>,
}

impl TypeConverter {
    /// Creates a converter using the target's default descriptor model.
    pub fn new(catalog: Arc<AbiCatalog>) -> Self {
        let descriptor_model = DescriptorFieldModel::for_catalog(&catalog);
        Self::with_descriptor_model(catalog, descriptor_model)
    }

    pub fn with_descriptor_model(catalog: Arc<AbiCatalog>, descriptor_model: DescriptorFieldModel) -> Self {
        log::debug!("type converter for {}", catalog.triple());
        TypeConverter {
            catalog,
            descriptor_model,
            ident_struct_cache: FxHashMap::default(),
            record_errors: FxHashMap::default(),
            reserved: Vec::new(),
        }
    }

    /// Builds the catalog from `config` and a converter over it.
    pub fn for_target(config: &TargetConfig) -> TargetResult<Self> {
        Ok(Self::new(Arc::new(config.build()?)))
    }

    pub fn catalog(&self) -> &Arc<AbiCatalog> {
        &self.catalog
    }

    pub fn kind_map(&self) -> &KindMapping {
        self.catalog.kind_map()
    }

    pub fn descriptor_model(&self) -> &DescriptorFieldModel {
        &self.descriptor_model
    }

    /// Lowers a source type to its physical type.
    pub fn lower(&mut self, ty: &SourceType) -> LowerResult<PhysicalType> {
        log::trace!("type convert: {}", ty);
        match ty {
            SourceType::Box(boxed) => self.lower_box(boxed, None),
            SourceType::BoxChar { kind } => {
                let element = self.lower(&SourceType::boxchar_element(*kind))?;
                Ok(self.catalog.boxchar_memory_type(&element))
            }
            SourceType::BoxProc(sig) => self.lower_box_proc(sig),
            SourceType::Character { kind, len } => self.lower_character(*kind, *len),
            SourceType::Complex(kind) => {
                let part = self.complex_part_type(*kind)?;
                Ok(self.catalog.complex_memory_type(&part))
            }
            SourceType::Record(record) => self.lower_record(record),
            SourceType::Logical(kind) => self.logical_type(*kind),
            SourceType::Integer(kind) => self.integer_type(*kind),
            SourceType::Real(kind) => self.real_type(*kind),
            SourceType::PointerLike { pointee, .. } => self.lower_pointer_like(pointee),
            SourceType::Sequence(seq) => self.lower_sequence(seq),
            SourceType::Vector { element, len } => {
                Ok(PhysicalType::vector_of(self.lower(element)?, *len))
            }
            SourceType::Tuple(_) => self.lower_tuple(ty),
            SourceType::Function(sig) => self.lower_function(sig),
            // i32 because struct field indices must be i32 constants.
            SourceType::Field | SourceType::Len => Ok(self.offset_type()),
            // TODO: lower to the runtime's derived-type description struct once
            // polymorphic descriptors are supported.
            SourceType::TypeDesc(_) => Ok(PhysicalType::OpaquePointer),
            SourceType::None => Ok(PhysicalType::empty_struct()),
        }
    }

    // char<k,n> --> [n x iK], char<k,?> --> iK
    fn lower_character(&self, kind: KindTy, len: CharLen) -> LowerResult<PhysicalType> {
        let char_ty = PhysicalType::int(self.character_bit_width(kind)?);
        Ok(match len {
            CharLen::Known(n) => PhysicalType::array_of(char_ty, n),
            CharLen::Unknown => char_ty,
        })
    }

    fn real_type(&self, kind: KindTy) -> LowerResult<PhysicalType> {
        let class = self.kind_map().real_class(kind).ok_or_else(|| {
            LowerError::UnsupportedConstruct(format!("real<{}> has no floating-point format", kind))
        })?;
        float_type(class, &format!("real<{}>", kind))
    }

    /// Physical type of each part of a complex of `kind`.
    pub(crate) fn complex_part_type(&self, kind: KindTy) -> LowerResult<PhysicalType> {
        let class = self.kind_map().complex_class(kind).ok_or_else(|| {
            LowerError::UnsupportedConstruct(format!("complex<{}> has no floating-point format", kind))
        })?;
        float_type(class, &format!("complex<{}>", kind))
    }

    // boxproc<sig> --> { sig*, i8* }
    fn lower_box_proc(&mut self, sig: &FunctionType) -> LowerResult<PhysicalType> {
        let func = self.lower_function(sig)?;
        Ok(PhysicalType::literal_struct(vec![
            PhysicalType::pointer_to(func),
            PhysicalType::OpaquePointer,
        ]))
    }

    fn lower_function(&mut self, sig: &FunctionType) -> LowerResult<PhysicalType> {
        let params = sig
            .inputs
            .iter()
            .map(|ty| self.lower(ty))
            .collect::<LowerResult<Vec<_>>>()?;
        let results = sig
            .results
            .iter()
            .map(|ty| self.lower(ty))
            .collect::<LowerResult<Vec<_>>>()?;
        Ok(PhysicalType::Function { params, results })
    }
}

fn float_type(class: FloatClass, what: &str) -> LowerResult<PhysicalType> {
    match class {
        FloatClass::Half
        | FloatClass::BFloat
        | FloatClass::Single
        | FloatClass::Double
        | FloatClass::X87Extended
        | FloatClass::Quad => Ok(PhysicalType::Float(class)),
        FloatClass::PpcDoubleDouble => Err(LowerError::UnsupportedConstruct(format!(
            "{} uses floating-point format {}",
            what,
            class.map_name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fircg_types::{RecordType, Shape};

    fn converter_with_map(triple: &str, map: &str) -> TypeConverter {
        TypeConverter::for_target(&TargetConfig::new(triple).with_kind_map(map)).unwrap()
    }

    fn converter() -> TypeConverter {
        converter_with_map("x86_64-unknown-linux-gnu", "")
    }

    #[test]
    fn scalars_follow_kind_map() {
        let mut conv = converter_with_map("x86_64-unknown-linux-gnu", "i10:80,l1:8");
        assert_eq!(conv.lower(&SourceType::integer(4)).unwrap(), PhysicalType::int(32));
        assert_eq!(conv.lower(&SourceType::integer(10)).unwrap(), PhysicalType::int(80));
        assert_eq!(conv.lower(&SourceType::logical(1)).unwrap(), PhysicalType::int(8));
        assert_eq!(
            conv.lower(&SourceType::real(8)).unwrap(),
            PhysicalType::Float(FloatClass::Double)
        );
        assert_eq!(
            conv.lower(&SourceType::real(10)).unwrap(),
            PhysicalType::Float(FloatClass::X87Extended)
        );
    }

    #[test]
    fn unknown_or_unsupported_real_formats_fail() {
        let mut conv = converter_with_map("x86_64-unknown-linux-gnu", "r6:PPC_FP128");
        assert!(matches!(
            conv.lower(&SourceType::real(6)),
            Err(LowerError::UnsupportedConstruct(_))
        ));
        assert!(matches!(
            conv.lower(&SourceType::real(7)),
            Err(LowerError::UnsupportedConstruct(_))
        ));
    }

    #[test]
    fn characters() {
        let mut conv = converter();
        assert_eq!(conv.lower(&SourceType::character(1, 10)).unwrap().to_string(), "[10 x i8]");
        assert_eq!(conv.lower(&SourceType::character(4, 3)).unwrap().to_string(), "[3 x i32]");
        assert_eq!(conv.lower(&SourceType::dynamic_character(1)).unwrap(), PhysicalType::int(8));
    }

    #[test]
    fn complex_in_memory_is_a_pair() {
        let mut conv = converter_with_map("i386-unknown-linux-gnu", "");
        assert_eq!(conv.lower(&SourceType::complex(4)).unwrap().to_string(), "{ float, float }");
        assert_eq!(conv.lower(&SourceType::complex(16)).unwrap().to_string(), "{ fp128, fp128 }");
    }

    #[test]
    fn boxchar_and_boxproc() {
        let mut conv = converter();
        assert_eq!(conv.lower(&SourceType::BoxChar { kind: 2 }).unwrap().to_string(), "{ i16*, i64 }");
        let sig = FunctionType::new(vec![SourceType::reference(SourceType::integer(4))], vec![]);
        assert_eq!(
            conv.lower(&SourceType::BoxProc(Arc::new(sig))).unwrap().to_string(),
            "{ void (i32*)*, i8* }"
        );
    }

    #[test]
    fn markers_vectors_and_unit() {
        let mut conv = converter();
        assert_eq!(conv.lower(&SourceType::Field).unwrap(), PhysicalType::int(32));
        assert_eq!(conv.lower(&SourceType::Len).unwrap(), PhysicalType::int(32));
        assert_eq!(
            conv.lower(&SourceType::type_desc(SourceType::integer(4))).unwrap(),
            PhysicalType::OpaquePointer
        );
        assert_eq!(conv.lower(&SourceType::None).unwrap(), PhysicalType::empty_struct());
        assert_eq!(
            conv.lower(&SourceType::vector(SourceType::real(4), 4)).unwrap().to_string(),
            "<4 x float>"
        );
    }

    #[test]
    fn function_results() {
        let mut conv = converter();
        let ty = SourceType::function(
            vec![SourceType::integer(8)],
            vec![SourceType::real(4), SourceType::logical(4)],
        );
        assert_eq!(conv.lower(&ty).unwrap().to_string(), "{ float, i32 } (i64)");
    }

    #[test]
    fn errors_propagate_out_of_nested_types() {
        let mut conv = converter();
        let rec = RecordType::with_fields("bad", vec![("x".into(), SourceType::real(7))]);
        let ty = SourceType::heap(SourceType::sequence(
            Shape::new(vec![fircg_types::Extent::Known(2)]),
            SourceType::record(&rec),
        ));
        assert!(matches!(conv.lower(&ty), Err(LowerError::UnsupportedConstruct(_))));
    }
}
