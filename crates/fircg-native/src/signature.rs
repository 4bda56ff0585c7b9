use crate::error::{NativeError, NativeResult};
use crate::types::{flatten_return, translate_type};
use cranelift_codegen::ir::{types, AbiParam, ArgumentPurpose, Signature, Type};
use cranelift_codegen::isa::CallConv;
use fircg_layout::{LoweredSignature, TypeConverter};
use fircg_target::{AbiCatalog, TargetAbi};
use fircg_types::FunctionType;
use target_lexicon::OperatingSystem;

/// Calling convention Cranelift should use for the catalog's target.
pub fn default_call_conv(catalog: &AbiCatalog) -> CallConv {
    match (catalog.abi(), catalog.triple().operating_system) {
        (TargetAbi::AArch64, OperatingSystem::Darwin) => CallConv::AppleAarch64,
        _ => CallConv::SystemV,
    }
}

/// Integer type wide enough to hold an address on the catalog's target.
pub fn pointer_type(catalog: &AbiCatalog) -> Type {
    match catalog.default_width() {
        32 => types::I32,
        _ => types::I64,
    }
}

/// Creates a Cranelift signature from a lowered signature.
pub fn native_signature(
    lowered: &LoweredSignature,
    call_conv: CallConv,
    pointer_type: Type,
) -> NativeResult<Signature> {
    let mut sig = Signature::new(call_conv);

    for (ty, attrs) in &lowered.params {
        let cl_type = translate_type(ty, pointer_type)?;
        if attrs.is_sret() {
            sig.params.push(AbiParam::special(cl_type, ArgumentPurpose::StructReturn));
        } else {
            sig.params.push(AbiParam::new(cl_type));
        }
    }

    let mut returns = Vec::new();
    for (ty, _) in &lowered.results {
        flatten_return(ty, pointer_type, &mut returns)?;
    }
    sig.returns.extend(returns.into_iter().map(AbiParam::new));

    log::trace!("native signature: {}", sig);
    Ok(sig)
}

/// Lowers `func` with `converter` and renders it for the converter's target.
pub fn translate_signature(
    converter: &mut TypeConverter,
    func: &FunctionType,
    hidden_result: Option<usize>,
) -> Result<Signature, NativeError> {
    let lowered = converter.lower_signature(func, hidden_result)?;
    let catalog = converter.catalog().clone();
    native_signature(&lowered, default_call_conv(&catalog), pointer_type(&catalog))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fircg_target::{Attributes, TargetConfig};
    use fircg_types::{FloatClass, PhysicalType};
    use std::sync::Arc;

    fn catalog(triple: &str) -> AbiCatalog {
        TargetConfig::new(triple).build().unwrap()
    }

    #[test]
    fn call_conv_per_target() {
        assert_eq!(default_call_conv(&catalog("aarch64-apple-darwin")), CallConv::AppleAarch64);
        assert_eq!(default_call_conv(&catalog("aarch64-unknown-linux-gnu")), CallConv::SystemV);
        assert_eq!(default_call_conv(&catalog("x86_64-apple-darwin")), CallConv::SystemV);
        assert_eq!(pointer_type(&catalog("i386-unknown-linux-gnu")), types::I32);
        assert_eq!(pointer_type(&catalog("x86_64-unknown-linux-gnu")), types::I64);
    }

    #[test]
    fn sret_slot_is_special() {
        let pair = PhysicalType::literal_struct(vec![
            PhysicalType::Float(FloatClass::Double),
            PhysicalType::Float(FloatClass::Double),
        ]);
        let lowered = LoweredSignature {
            params: vec![
                (PhysicalType::pointer_to(pair), Attributes::new().with_alignment(4).sret()),
                (PhysicalType::int(32), Attributes::new()),
            ],
            results: vec![],
        };
        let sig = native_signature(&lowered, CallConv::SystemV, types::I32).unwrap();
        assert_eq!(sig.params[0], AbiParam::special(types::I32, ArgumentPurpose::StructReturn));
        assert_eq!(sig.params[1], AbiParam::new(types::I32));
        assert!(sig.returns.is_empty());
    }

    #[test]
    fn struct_params_are_unsupported() {
        let lowered = LoweredSignature {
            params: vec![(PhysicalType::empty_struct(), Attributes::new())],
            results: vec![],
        };
        assert!(matches!(
            native_signature(&lowered, CallConv::SystemV, types::I64),
            Err(NativeError::UnsupportedSlot { .. })
        ));
    }

    #[test]
    fn translate_uses_the_converter_target() {
        let mut conv = TypeConverter::new(Arc::new(catalog("aarch64-apple-darwin")));
        let func = FunctionType::new(
            vec![fircg_types::SourceType::complex(8)],
            vec![fircg_types::SourceType::complex(8)],
        );
        let sig = translate_signature(&mut conv, &func, None).unwrap();
        assert_eq!(sig.call_conv, CallConv::AppleAarch64);
        assert_eq!(
            sig.params,
            vec![AbiParam::new(types::F64), AbiParam::new(types::F64)]
        );
        assert_eq!(
            sig.returns,
            vec![AbiParam::new(types::F64), AbiParam::new(types::F64)]
        );
    }
}
