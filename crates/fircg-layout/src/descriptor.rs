//! Physical layout of boxed descriptors.
//!
//! ```text
//! { T*, elem_size, rank, type_tag, attributes, extra, [rank x [3 x iW]] }
//! ```
//!
//! The header is always six fields in this order. The trailing row array
//! (extent, stride, lower bound per dimension) is present only when the rank
//! is known and positive.

use crate::{LowerError, LowerResult, TypeConverter};
use fircg_target::AbiCatalog;
use fircg_types::{BoxType, PhysicalType, Rank, SourceType};

/// Number of header fields preceding the optional row array.
pub const DESCRIPTOR_HEADER_FIELDS: usize = 6;

/// Entries per dimension row: extent, stride, lower bound.
pub const DESCRIPTOR_ROW_ENTRIES: u64 = 3;

/// Position of each field in a lowered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorField {
    BaseAddress = 0,
    ElementSize = 1,
    Rank = 2,
    TypeTag = 3,
    Attributes = 4,
    ExtraFlags = 5,
    Dims = 6,
}

impl DescriptorField {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Integer widths of the descriptor fields. Must agree with the runtime
/// routines that read the same descriptors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorFieldModel {
    pub element_size_width: u32,
    pub rank_width: u32,
    pub type_tag_width: u32,
    pub attribute_width: u32,
    pub extra_width: u32,
    /// Width of each extent/stride/lower-bound entry.
    pub dim_entry_width: u32,
}

impl DescriptorFieldModel {
    /// `size_t` and index entries use the target word; the flag-sized fields
    /// are one byte each.
    pub fn for_word_width(word: u32) -> Self {
        DescriptorFieldModel {
            element_size_width: word,
            rank_width: 8,
            type_tag_width: 8,
            attribute_width: 8,
            extra_width: 8,
            dim_entry_width: word,
        }
    }

    pub fn for_catalog(catalog: &AbiCatalog) -> Self {
        Self::for_word_width(catalog.default_width())
    }

    /// Types of header fields 2 through 6.
    pub fn header_field_types(&self) -> [PhysicalType; 5] {
        [
            PhysicalType::int(self.element_size_width),
            PhysicalType::int(self.rank_width),
            PhysicalType::int(self.type_tag_width),
            PhysicalType::int(self.attribute_width),
            PhysicalType::int(self.extra_width),
        ]
    }

    pub fn row_type(&self) -> PhysicalType {
        PhysicalType::array_of(PhysicalType::int(self.dim_entry_width), DESCRIPTOR_ROW_ENTRIES)
    }
}

impl TypeConverter {
    /// box<T> --> descriptor*
    ///
    /// `rank` overrides both the declared rank and the rank derived from `T`.
    pub fn lower_box(&mut self, boxed: &BoxType, rank: Option<Rank>) -> LowerResult<PhysicalType> {
        Ok(PhysicalType::pointer_to(self.descriptor_struct(boxed, rank)?))
    }

    /// The descriptor struct itself, without the outer pointer.
    pub fn descriptor_struct(&mut self, boxed: &BoxType, rank: Option<Rank>) -> LowerResult<PhysicalType> {
        if boxed.polymorphic {
            return Err(LowerError::UnimplementedExtension(format!(
                "extended descriptor for polymorphic entity of type {}",
                boxed.element
            )));
        }

        let element = boxed.element.pointee().unwrap_or(&boxed.element);
        let element_ty = self.lower(element)?;
        // A runtime-shaped sequence is already a pointer to its elements.
        let base_address = if matches!(element, SourceType::Sequence(_)) && element_ty.is_pointer() {
            element_ty
        } else {
            PhysicalType::pointer_to(element_ty)
        };

        let mut fields = Vec::with_capacity(DESCRIPTOR_HEADER_FIELDS + 1);
        fields.push(base_address);
        fields.extend(self.descriptor_model.header_field_types());

        let rank = rank
            .or(boxed.declared_rank)
            .unwrap_or_else(|| derived_rank(element));
        if let Rank::Known(dims) = rank {
            if dims > 0 {
                fields.push(PhysicalType::array_of(self.descriptor_model.row_type(), u64::from(dims)));
            }
        }
        Ok(PhysicalType::literal_struct(fields))
    }
}

fn derived_rank(element: &SourceType) -> Rank {
    match element {
        SourceType::Sequence(seq) if seq.has_unknown_shape() => Rank::Unknown,
        SourceType::Sequence(seq) => Rank::Known(seq.dimension() as u32),
        _ => Rank::Known(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fircg_target::TargetConfig;
    use fircg_types::{Extent, Shape};

    fn converter(triple: &str) -> TypeConverter {
        TypeConverter::for_target(&TargetConfig::new(triple)).unwrap()
    }

    fn descriptor_fields(conv: &mut TypeConverter, ty: &SourceType) -> Vec<PhysicalType> {
        let lowered = conv.lower(ty).unwrap();
        lowered.pointee().unwrap().struct_fields().unwrap().to_vec()
    }

    #[test]
    fn rank_two_has_row_array() {
        let mut conv = converter("x86_64-unknown-linux-gnu");
        let ty = SourceType::boxed(SourceType::heap(SourceType::sequence(
            vec![Extent::Unknown, Extent::Unknown],
            SourceType::real(4),
        )));
        let fields = descriptor_fields(&mut conv, &ty);
        assert_eq!(fields.len(), 7);
        assert_eq!(fields[DescriptorField::BaseAddress.index()].to_string(), "float*");
        assert_eq!(fields[DescriptorField::Dims.index()].to_string(), "[2 x [3 x i64]]");
    }

    #[test]
    fn scalar_descriptor_has_six_fields() {
        let mut conv = converter("x86_64-unknown-linux-gnu");
        let fields = descriptor_fields(&mut conv, &SourceType::boxed(SourceType::integer(4)));
        assert_eq!(fields.len(), DESCRIPTOR_HEADER_FIELDS);
        assert_eq!(
            fields.iter().map(ToString::to_string).collect::<Vec<_>>(),
            vec!["i32*", "i64", "i8", "i8", "i8", "i8"]
        );
    }

    #[test]
    fn word_width_follows_target() {
        let mut conv = converter("i386-unknown-linux-gnu");
        let ty = SourceType::boxed(SourceType::sequence(vec![Extent::Unknown], SourceType::integer(8)));
        let fields = descriptor_fields(&mut conv, &ty);
        assert_eq!(fields[DescriptorField::ElementSize.index()], PhysicalType::int(32));
        assert_eq!(fields[DescriptorField::Dims.index()].to_string(), "[1 x [3 x i32]]");
    }

    #[test]
    fn constant_shape_element_is_pointed_to() {
        let mut conv = converter("x86_64-unknown-linux-gnu");
        let ty = SourceType::boxed(SourceType::sequence(
            vec![Extent::Known(2), Extent::Known(3)],
            SourceType::integer(4),
        ));
        let fields = descriptor_fields(&mut conv, &ty);
        assert_eq!(fields[0].to_string(), "[3 x [2 x i32]]*");
        assert_eq!(fields.len(), 7);
    }

    #[test]
    fn unknown_rank_omits_rows() {
        let mut conv = converter("x86_64-unknown-linux-gnu");
        let assumed = SourceType::boxed(SourceType::sequence(Shape::assumed_rank(), SourceType::real(8)));
        assert_eq!(descriptor_fields(&mut conv, &assumed).len(), DESCRIPTOR_HEADER_FIELDS);

        let declared = SourceType::boxed_with_rank(SourceType::real(8), Rank::Unknown);
        assert_eq!(descriptor_fields(&mut conv, &declared).len(), DESCRIPTOR_HEADER_FIELDS);
    }

    #[test]
    fn explicit_rank_overrides_everything() {
        let mut conv = converter("aarch64-apple-darwin");
        let boxed = BoxType {
            element: std::sync::Arc::new(SourceType::real(4)),
            declared_rank: Some(Rank::Known(1)),
            polymorphic: false,
        };
        let lowered = conv.lower_box(&boxed, Some(Rank::Known(3))).unwrap();
        let fields = lowered.pointee().unwrap().struct_fields().unwrap();
        assert_eq!(fields[6].to_string(), "[3 x [3 x i64]]");

        let from_declared = conv.descriptor_struct(&boxed, None).unwrap();
        assert_eq!(from_declared.struct_fields().unwrap()[6].to_string(), "[1 x [3 x i64]]");

        let zero = conv.descriptor_struct(&boxed, Some(Rank::Known(0))).unwrap();
        assert_eq!(zero.struct_fields().unwrap().len(), DESCRIPTOR_HEADER_FIELDS);
    }

    #[test]
    fn polymorphic_needs_extended_layout() {
        let mut conv = converter("x86_64-unknown-linux-gnu");
        let ty = SourceType::polymorphic_box(SourceType::integer(4));
        assert!(matches!(conv.lower(&ty), Err(LowerError::UnimplementedExtension(_))));
    }

    #[test]
    fn custom_model_is_used() {
        let catalog = std::sync::Arc::new(TargetConfig::new("x86_64-unknown-linux-gnu").build().unwrap());
        let model = DescriptorFieldModel { type_tag_width: 16, ..DescriptorFieldModel::for_word_width(64) };
        let mut conv = TypeConverter::with_descriptor_model(catalog, model);
        let fields = descriptor_fields(&mut conv, &SourceType::boxed(SourceType::integer(4)));
        assert_eq!(fields[DescriptorField::TypeTag.index()], PhysicalType::int(16));
    }
}
