//! Source text → IR → Cranelift → object bytes.

use cranelift_codegen::ir::Opcode;
use pyaot_codegen::{compile_object, lower, CodegenContext, CodegenError, CodegenOptions, OptLevel};

fn backend(src: &str) -> pyaot_codegen::BackendModule {
    let ir = pyaot_compiler::compile(src).expect("translation should succeed");
    lower(&ir, CodegenContext::new().unwrap()).expect("lowering should succeed")
}

fn lowering_error(src: &str) -> CodegenError {
    let ir = pyaot_compiler::compile(src).expect("translation should succeed");
    match lower(&ir, CodegenContext::new().unwrap()) {
        Err(e) => e,
        Ok(_) => panic!("expected lowering to fail:\n{src}"),
    }
}

const ADD: &str = "\
def add(a: int64, b: int64) -> int64:
    return poke64(a, a * b + 2)
";

#[test]
fn poke_of_arithmetic_lowers_to_one_store() {
    let module = backend(ADD);
    assert_eq!(module.functions.len(), 1);
    let add = module.function("add").unwrap();
    assert_eq!(add.count_opcode(Opcode::Store), 1);
    assert_eq!(add.count_opcode(Opcode::Imul), 1);
    assert_eq!(add.count_opcode(Opcode::Iadd), 1);
    // The only constant is the literal 2.
    assert_eq!(add.count_opcode(Opcode::Iconst), 1);
    assert_eq!(add.count_opcode(Opcode::Return), 1);
}

#[test]
fn folded_literals_emit_a_single_constant() {
    let module = backend("def f(p: int64) -> None:\n    poke32(p, 2 * 3 + 4)\n");
    let f = module.function("f").unwrap();
    assert_eq!(f.count_opcode(Opcode::Iadd), 0);
    assert_eq!(f.count_opcode(Opcode::Imul), 0);
    assert_eq!(f.count_opcode(Opcode::Iconst), 1);
    assert!(f.clif_text().contains("iconst.i32 10"), "{}", f.clif_text());
}

#[test]
fn parameter_reference_is_not_a_constant() {
    let module = backend("def id(a: int64) -> int64:\n    return a\n");
    assert_eq!(module.function("id").unwrap().count_opcode(Opcode::Iconst), 0);
}

#[test]
fn constants_and_enums_lower_to_immediates() {
    let src = "\
const(BASE=4096)

@enum
class Reg:
    CTRL = 0
    DATA = 8

def write(v: int8) -> None:
    poke8(BASE + Reg.DATA, v)
";
    let module = backend(src);
    let write = module.function("write").unwrap();
    assert_eq!(write.count_opcode(Opcode::Store), 1);
    assert!(write.clif_text().contains("iconst.i64 4104"), "{}", write.clif_text());
}

#[test]
fn high_half_address_is_accepted() {
    let module = backend("def mark() -> None:\n    poke8(0xffff800000000000, 1)\n");
    let mark = module.function("mark").unwrap();
    assert_eq!(mark.count_opcode(Opcode::Store), 1);
    assert_eq!(mark.count_opcode(Opcode::Iconst), 2);
}

#[test]
fn function_named_like_const_is_callable() {
    let src = "\
def constrain(x: int64) -> int64:
    return x

def f() -> int64:
    return constrain(5)
";
    let module = backend(src);
    assert_eq!(module.function("f").unwrap().count_opcode(Opcode::Call), 1);
}

#[test]
fn calls_resolve_to_earlier_functions() {
    let src = "\
def double(x: int32) -> int32:
    return x * 2

def quad(x: int32) -> int32:
    return double(double(x))
";
    let module = backend(src);
    assert_eq!(module.function("quad").unwrap().count_opcode(Opcode::Call), 2);
}

#[test]
fn forward_call_is_unresolved() {
    let src = "\
def first() -> int64:
    return second()

def second() -> int64:
    return 1
";
    assert!(matches!(lowering_error(src), CodegenError::UnresolvedSymbol(ref n) if n == "second"));
}

#[test]
fn unknown_name_is_unresolved() {
    let err = lowering_error("def f() -> int64:\n    return missing\n");
    assert!(matches!(err, CodegenError::UnresolvedSymbol(ref n) if n == "missing"));
}

#[test]
fn typed_literal_must_match_context() {
    let err = lowering_error("def f() -> int64:\n    return int8(1)\n");
    assert!(matches!(err, CodegenError::SemanticError(ref m) if m.contains("type mismatch")));
}

#[test]
fn object_bytes_for_each_opt_level() {
    let ir = pyaot_compiler::compile(ADD).unwrap();
    for opt_level in [OptLevel::None, OptLevel::Speed, OptLevel::SpeedAndSize] {
        let options = CodegenOptions { opt_level, ..CodegenOptions::default() };
        let artifact = compile_object(&ir, &options).unwrap();
        assert!(artifact.bytes.len() > 16);
        assert_eq!(artifact.functions.len(), 1);
    }
}
