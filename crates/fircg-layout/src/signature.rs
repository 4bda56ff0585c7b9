use crate::{LowerError, LowerResult, TypeConverter};
use fircg_target::{Attributes, Marshalling};
use fircg_types::{FunctionType, PhysicalType, SourceType};

/// A procedure signature after the target calling convention is applied.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoweredSignature {
    pub params: Marshalling,
    pub results: Marshalling,
}

impl LoweredSignature {
    /// True when the first parameter is a hidden result reference.
    pub fn has_hidden_result(&self) -> bool {
        self.params.first().is_some_and(|(_, attrs)| attrs.is_sret())
    }

    /// The physical function type, without attributes.
    pub fn as_function_type(&self) -> PhysicalType {
        PhysicalType::Function {
            params: self.params.iter().map(|(ty, _)| ty.clone()).collect(),
            results: self.results.iter().map(|(ty, _)| ty.clone()).collect(),
        }
    }
}

impl TypeConverter {
    /// Rewrites a procedure signature for the target.
    ///
    /// `hidden_result` is the index of the parameter that carries a CHARACTER
    /// function result, if any. Its length stays next to its address; every
    /// other boxed character length moves after the declared parameters.
    pub fn lower_signature(
        &mut self,
        sig: &FunctionType,
        hidden_result: Option<usize>,
    ) -> LowerResult<LoweredSignature> {
        let mut hidden: Marshalling = Vec::new();
        let mut results: Marshalling = Vec::new();
        for ty in &sig.results {
            match ty {
                SourceType::Complex(kind) => {
                    let part = self.complex_part_type(*kind)?;
                    for slot in self.catalog.complex_return_type(&part)? {
                        if slot.1.is_sret() {
                            hidden.push(slot);
                        } else {
                            results.push(slot);
                        }
                    }
                }
                SourceType::BoxChar { .. } => {
                    return Err(LowerError::UnsupportedConstruct(format!(
                        "{} returned by value; CHARACTER results must be passed as a hidden argument",
                        ty
                    )));
                }
                _ => results.push((self.lower(ty)?, Attributes::new())),
            }
        }

        let mut params = hidden;
        let mut trailing: Marshalling = Vec::new();
        for (index, ty) in sig.inputs.iter().enumerate() {
            let slots = match ty {
                SourceType::Complex(kind) => {
                    let part = self.complex_part_type(*kind)?;
                    self.catalog.complex_argument_type(&part)?
                }
                SourceType::BoxChar { kind } => {
                    let element = self.lower(&SourceType::boxchar_element(*kind))?;
                    self.catalog.boxchar_argument_type(&element, hidden_result == Some(index))
                }
                _ => vec![(self.lower(ty)?, Attributes::new())],
            };
            for slot in slots {
                if slot.1.is_append() {
                    trailing.push(slot);
                } else {
                    params.push(slot);
                }
            }
        }
        params.extend(trailing);

        log::debug!("lowered signature {}: {} params, {} results", sig, params.len(), results.len());
        Ok(LoweredSignature { params, results })
    }
}
