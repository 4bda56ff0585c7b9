use crate::{LowerResult, TypeConverter};
use fircg_types::{PhysicalType, SourceType};

impl TypeConverter {
    /// tuple<A, tuple<B, C>> --> { A, B, C }
    pub(crate) fn lower_tuple(&mut self, tuple: &SourceType) -> LowerResult<PhysicalType> {
        let members = tuple.flattened_members();
        let mut fields = Vec::with_capacity(members.len());
        for member in members {
            fields.push(self.lower(member)?);
        }
        Ok(PhysicalType::literal_struct(fields))
    }
}
