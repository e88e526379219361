//! Mapping from pyaot integer types to Cranelift IR types.

use cranelift_codegen::ir::{types, AbiParam, Signature, Type as ClifType};
use cranelift_module::Module;
use pyaot_core::ir::{IntegerType, ReturnType};

pub fn clif_type(ty: IntegerType) -> ClifType {
    match ty {
        IntegerType::I8 => types::I8,
        IntegerType::I16 => types::I16,
        IntegerType::I32 => types::I32,
        IntegerType::I64 => types::I64,
    }
}

/// Narrow integers are sign-extended at the ABI boundary.
fn abi_param(ty: IntegerType) -> AbiParam {
    let param = AbiParam::new(clif_type(ty));
    if ty.bits() < 32 {
        param.sext()
    } else {
        param
    }
}

/// Build the native signature for a function with the given parameter and
/// return types, using the module's default calling convention.
pub fn signature_for<M: Module>(
    module: &M,
    params: &[IntegerType],
    returns: ReturnType,
) -> Signature {
    let mut sig = module.make_signature();
    sig.params.extend(params.iter().map(|&ty| abi_param(ty)));
    if let ReturnType::Int(ty) = returns {
        sig.returns.push(abi_param(ty));
    }
    sig
}
