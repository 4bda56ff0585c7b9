use crate::error::{NativeError, NativeResult};
use cranelift_codegen::ir::types::{self, Type};
use fircg_types::{FloatClass, PhysicalType};

fn unsupported(ty: &PhysicalType, reason: &str) -> NativeError {
    NativeError::UnsupportedSlot {
        slot: ty.to_string(),
        reason: reason.to_string(),
    }
}

/// Translates a physical scalar, pointer or short vector into a Cranelift type.
///
/// Every pointer-like type becomes `pointer_type`, since Cranelift has no
/// typed pointers.
pub fn translate_type(ty: &PhysicalType, pointer_type: Type) -> NativeResult<Type> {
    match ty {
        PhysicalType::Integer(width) => u16::try_from(*width)
            .ok()
            .and_then(Type::int)
            .ok_or_else(|| unsupported(ty, "integer width is not 8, 16, 32, 64 or 128")),
        PhysicalType::Float(class) => translate_float(*class).ok_or_else(|| unsupported(ty, "no matching float type")),
        PhysicalType::Pointer(_) | PhysicalType::OpaquePointer => Ok(pointer_type),
        PhysicalType::Vector { element, count } => {
            let lane = match element.as_ref() {
                PhysicalType::Integer(_) | PhysicalType::Float(_) => translate_type(element, pointer_type)?,
                _ => return Err(unsupported(ty, "vector lanes must be scalars")),
            };
            u32::try_from(*count)
                .ok()
                .and_then(|lanes| lane.by(lanes))
                .ok_or_else(|| unsupported(ty, "lane count has no vector type"))
        }
        PhysicalType::Array { .. } | PhysicalType::Struct(_) => {
            Err(unsupported(ty, "aggregates are not passed by value"))
        }
        PhysicalType::Function { .. } => Err(unsupported(ty, "functions are only passed by address")),
    }
}

fn translate_float(class: FloatClass) -> Option<Type> {
    match class {
        FloatClass::Half => Some(types::F16),
        FloatClass::Single => Some(types::F32),
        FloatClass::Double => Some(types::F64),
        FloatClass::Quad => Some(types::F128),
        FloatClass::BFloat | FloatClass::X87Extended | FloatClass::PpcDoubleDouble => None,
    }
}

/// Scalar fields of a struct returned by value, in order. Non-struct types
/// translate to themselves.
pub fn flatten_return(ty: &PhysicalType, pointer_type: Type, out: &mut Vec<Type>) -> NativeResult<()> {
    match ty {
        PhysicalType::Struct(_) => {
            let fields = ty
                .struct_fields()
                .ok_or_else(|| unsupported(ty, "struct has no body"))?;
            for field in fields {
                flatten_return(field, pointer_type, out)?;
            }
            Ok(())
        }
        _ => {
            out.push(translate_type(ty, pointer_type)?);
            Ok(())
        }
    }
}
