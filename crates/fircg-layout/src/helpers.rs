//! Size queries and the fixed helper types of the converter.

use crate::{LowerError, LowerResult, TypeConverter};
use fircg_types::{CharLen, KindTy, PhysicalType, RecordType, SourceType};
use rustc_hash::FxHashSet;

/// Width of struct field indices.
const OFFSET_WIDTH: u32 = 32;
/// Width of array indices and extents in address arithmetic.
const INDEX_WIDTH: u32 = 64;

/// True for a character whose length is only known at run time.
pub fn has_dynamic_size(ty: &SourceType) -> bool {
    matches!(ty, SourceType::Character { len: CharLen::Unknown, .. })
}

/// True if `ty` (or the element of a sequence `ty`) is a record that inlines
/// an array without a constant shape, directly or through nested records.
///
/// References are not followed: their pointees are not stored inline.
pub fn is_dynamically_sized(ty: &SourceType) -> bool {
    let ty = match ty {
        SourceType::Sequence(seq) => &*seq.element,
        other => other,
    };
    match ty {
        SourceType::Record(record) => record_is_dynamically_sized(record, &mut FxHashSet::default()),
        _ => false,
    }
}

fn record_is_dynamically_sized<'a>(record: &'a RecordType, visiting: &mut FxHashSet<&'a str>) -> bool {
    if !visiting.insert(record.name()) {
        return false;
    }
    let Some(fields) = record.fields() else {
        return false;
    };
    fields.iter().any(|(_, field)| match field {
        SourceType::Sequence(seq) => !seq.has_constant_shape(),
        SourceType::Record(inner) => record_is_dynamically_sized(inner, visiting),
        _ => false,
    })
}

impl TypeConverter {
    pub fn has_dynamic_size(&self, ty: &SourceType) -> bool {
        has_dynamic_size(ty)
    }

    pub fn character_bit_width(&self, kind: KindTy) -> LowerResult<u32> {
        self.kind_map()
            .character_bit_width(kind)
            .ok_or_else(|| no_width("char", kind))
    }

    /// i32, the type of struct field offsets.
    pub fn offset_type(&self) -> PhysicalType {
        PhysicalType::int(OFFSET_WIDTH)
    }

    pub fn index_type(&self) -> PhysicalType {
        PhysicalType::int(INDEX_WIDTH)
    }

    /// Integer type of the default INTEGER kind.
    pub fn default_integer(&self) -> LowerResult<PhysicalType> {
        self.integer_type(self.kind_map().default_integer_kind())
    }

    pub(crate) fn integer_type(&self, kind: KindTy) -> LowerResult<PhysicalType> {
        let width = self.kind_map().integer_bit_width(kind).ok_or_else(|| no_width("int", kind))?;
        Ok(PhysicalType::int(width))
    }

    pub(crate) fn logical_type(&self, kind: KindTy) -> LowerResult<PhysicalType> {
        let width = self.kind_map().logical_bit_width(kind).ok_or_else(|| no_width("logical", kind))?;
        Ok(PhysicalType::int(width))
    }

    /// Number of record names bound to a struct identity so far.
    pub fn cached_record_count(&self) -> usize {
        self.ident_struct_cache.len()
    }
}

fn no_width(category: &str, kind: KindTy) -> LowerError {
    LowerError::UnsupportedConstruct(format!("{}<{}> has no representable bit width", category, kind))
}
