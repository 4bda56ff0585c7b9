use crate::helpers::has_dynamic_size;
use crate::{LowerResult, TypeConverter};
use fircg_types::{Extent, PhysicalType, SequenceType, SourceType};

impl TypeConverter {
    /// array<c0 x c1 x ... : T> --> [... [c1 x [c0 x T]]]
    ///
    /// Dimensions are nested from the first (innermost) outward. At the first
    /// unknown extent the sequence degenerates to a pointer to the arrays
    /// built so far.
    pub(crate) fn lower_sequence(&mut self, seq: &SequenceType) -> LowerResult<PhysicalType> {
        let mut base = self.lower(&seq.element)?;
        if has_dynamic_size(&seq.element) {
            return Ok(PhysicalType::pointer_to(base));
        }
        for extent in &seq.shape.extents()[..seq.constant_rows()] {
            if let Extent::Known(count) = extent {
                base = PhysicalType::array_of(base, *count);
            }
        }
        if seq.has_constant_shape() {
            return Ok(base);
        }
        Ok(PhysicalType::pointer_to(base))
    }

    /// ref<T>, ptr<T>, heap<T> --> T*
    pub(crate) fn lower_pointer_like(&mut self, pointee: &SourceType) -> LowerResult<PhysicalType> {
        let mut element = pointee;
        // A runtime-shaped sequence already lowers to a pointer; referencing
        // it must not add a second level of indirection.
        if let SourceType::Sequence(seq) = pointee {
            if !seq.has_constant_shape() || has_dynamic_size(&seq.element) {
                if seq.has_constant_interior() {
                    return self.lower(pointee);
                }
                element = &seq.element;
            }
        }
        // A descriptor is already a pointer, so ref<box<T>> and box<T> are the
        // same physical type.
        if let SourceType::Box(_) = element {
            return self.lower(element);
        }
        Ok(PhysicalType::pointer_to(self.lower(element)?))
    }
}
