//! IR → Cranelift lowering.
//!
//! The [`Emitter`] walks an IR module once, in source order. Each function is
//! entered into the function table before its body is lowered, so a function
//! can call itself and anything defined above it, but nothing below it.
//!
//! Inside a function, [`FunctionLowering`] owns the `FunctionBuilder` and the
//! parameter environment. Expression lowering is driven by an *expected type*:
//! untyped literals adopt it, everything else must agree with it.

use std::collections::HashMap;

use cranelift_codegen::ir::{
    types, Function, FuncRef, InstBuilder, MemFlags, Opcode, Type as ClifType, UserFuncName,
    Value,
};
use cranelift_codegen::Context;
use cranelift_frontend::{FunctionBuilder, FunctionBuilderContext};
use cranelift_module::{FuncId, Linkage, Module};
use log::debug;
use pyaot_core::ir::{self, BinaryOperator, IntegerType, IrNode, ReturnType};

use crate::emit::CodegenError;
use crate::types::{clif_type, signature_for};

/// A function visible to calls.
#[derive(Debug, Clone)]
pub struct FunctionEntry {
    pub func_id: FuncId,
    pub params: Vec<IntegerType>,
    pub returns: ReturnType,
}

/// A lowered function, kept for inspection after the module is built.
#[derive(Debug, Clone)]
pub struct LoweredFunction {
    pub name: String,
    pub func_id: FuncId,
    /// CLIF as produced by lowering, before Cranelift's own optimisations.
    pub function: Function,
}

impl LoweredFunction {
    pub fn clif_text(&self) -> String {
        self.function.display().to_string()
    }

    /// Number of instructions with the given opcode.
    pub fn count_opcode(&self, opcode: Opcode) -> usize {
        let func = &self.function;
        func.layout
            .blocks()
            .flat_map(|block| func.layout.block_insts(block))
            .filter(|&inst| func.dfg.insts[inst].opcode() == opcode)
            .count()
    }
}

pub struct Emitter<'m, M: Module> {
    module: &'m mut M,
    functions: HashMap<String, FunctionEntry>,
    fb_ctx: FunctionBuilderContext,
    ctx: Context,
}

impl<'m, M: Module> Emitter<'m, M> {
    pub fn new(module: &'m mut M) -> Self {
        Self {
            module,
            functions: HashMap::new(),
            fb_ctx: FunctionBuilderContext::new(),
            ctx: Context::new(),
        }
    }

    /// Lower every function of `ir` into the backend module.
    pub fn lower_module(mut self, ir: &ir::Module) -> Result<Vec<LoweredFunction>, CodegenError> {
        let mut lowered = Vec::new();
        for node in &ir.body {
            match node {
                IrNode::FunctionDef(def) => lowered.push(self.lower_function(def)?),
                // Declarations were resolved during translation.
                IrNode::EnumDecl { .. } | IrNode::ConstDecl { .. } => {}
                other => {
                    return Err(CodegenError::SemanticError(format!(
                        "{} is not allowed at module level",
                        other.kind_name()
                    )))
                }
            }
        }
        Ok(lowered)
    }

    pub fn function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.get(name)
    }

    fn lower_function(&mut self, def: &ir::FunctionDef) -> Result<LoweredFunction, CodegenError> {
        if self.functions.contains_key(&def.name) {
            return Err(CodegenError::SemanticError(format!(
                "function '{}' is defined more than once",
                def.name
            )));
        }
        let params: Vec<IntegerType> = def.params.iter().map(|p| p.ty).collect();
        let sig = signature_for(&*self.module, &params, def.return_type);
        let func_id = self
            .module
            .declare_function(&def.name, Linkage::Export, &sig)
            .map_err(|e| {
                CodegenError::LoweringError(format!("declare_function({}): {e}", def.name))
            })?;
        self.functions.insert(
            def.name.clone(),
            FunctionEntry { func_id, params, returns: def.return_type },
        );

        let mut func = Function::with_name_signature(UserFuncName::user(0, func_id.as_u32()), sig);
        {
            let mut builder = FunctionBuilder::new(&mut func, &mut self.fb_ctx);
            let entry_block = builder.create_block();
            builder.append_block_params_for_function_params(entry_block);
            builder.switch_to_block(entry_block);

            let mut env = HashMap::new();
            for (i, param) in def.params.iter().enumerate() {
                let val = builder.block_params(entry_block)[i];
                env.insert(param.name.clone(), (val, param.ty));
            }

            let pointer_type = self.module.target_config().pointer_type();
            let mut lowering = FunctionLowering {
                builder,
                module: &mut *self.module,
                functions: &self.functions,
                env,
                callee_refs: HashMap::new(),
                name: &def.name,
                return_type: def.return_type,
                pointer_type,
                terminated: false,
            };
            for stmt in &def.body {
                lowering.lower_statement(stmt)?;
            }
            lowering.finish();
        }

        let lowered = LoweredFunction { name: def.name.clone(), func_id, function: func.clone() };
        self.ctx = Context::for_function(func);
        self.module.define_function(func_id, &mut self.ctx).map_err(|e| {
            CodegenError::LoweringError(format!("define_function({}): {e:?}", def.name))
        })?;
        self.module.clear_context(&mut self.ctx);
        debug!("lowered function '{}'", def.name);
        Ok(lowered)
    }
}

struct FunctionLowering<'a, 'b, M: Module> {
    builder: FunctionBuilder<'b>,
    module: &'a mut M,
    functions: &'a HashMap<String, FunctionEntry>,
    /// Parameter name → (block value, declared type).
    env: HashMap<String, (Value, IntegerType)>,
    callee_refs: HashMap<FuncId, FuncRef>,
    name: &'a str,
    return_type: ReturnType,
    pointer_type: ClifType,
    terminated: bool,
}

impl<M: Module> FunctionLowering<'_, '_, M> {
    fn lower_statement(&mut self, node: &IrNode) -> Result<(), CodegenError> {
        if self.terminated {
            return Err(CodegenError::SemanticError(format!(
                "unreachable {} after return in '{}'",
                node.kind_name(),
                self.name
            )));
        }
        match node {
            IrNode::Return { value } => self.lower_return(value.as_deref()),
            IrNode::Call { callee, args } => self.lower_call(callee, args).map(|_| ()),
            IrNode::Poke { address, value, ty } => {
                self.lower_poke(address, value, *ty).map(|_| ())
            }
            IrNode::EnumDecl { .. } | IrNode::ConstDecl { .. } => Ok(()),
            IrNode::Variable { .. } | IrNode::IntegerLiteral { .. } | IrNode::BinaryOp { .. } => {
                self.lower_expr(node, None).map(|_| ())
            }
            IrNode::Module(_) | IrNode::FunctionDef(_) => Err(CodegenError::SemanticError(
                format!("{} is not allowed inside '{}'", node.kind_name(), self.name),
            )),
        }
    }

    /// The type an expression has on its own, if anything pins it down.
    fn natural_type(&self, node: &IrNode) -> Option<IntegerType> {
        match node {
            IrNode::Variable { name, ty } => self.env.get(name).map(|&(_, t)| t).or(*ty),
            IrNode::IntegerLiteral { ty, .. } => *ty,
            IrNode::BinaryOp { left, right, .. } => {
                self.natural_type(left).or_else(|| self.natural_type(right))
            }
            IrNode::Poke { ty, .. } => Some(*ty),
            IrNode::Call { callee, .. } => match self.functions.get(callee)?.returns {
                ReturnType::Int(ty) => Some(ty),
                ReturnType::NoReturn => None,
            },
            _ => None,
        }
    }

    fn check_type(
        &self,
        what: &str,
        actual: IntegerType,
        expected: Option<IntegerType>,
    ) -> Result<(), CodegenError> {
        match expected {
            Some(expected) if expected != actual => Err(CodegenError::SemanticError(format!(
                "type mismatch in '{}': {what} is {actual}, expected {expected}",
                self.name
            ))),
            _ => Ok(()),
        }
    }

    fn lower_expr(
        &mut self,
        node: &IrNode,
        expected: Option<IntegerType>,
    ) -> Result<(Value, IntegerType), CodegenError> {
        match node {
            IrNode::IntegerLiteral { value, ty } => {
                let ty = match (*ty, expected) {
                    (Some(ty), expected) => {
                        self.check_type(&format!("literal {value}"), ty, expected)?;
                        ty
                    }
                    (None, Some(expected)) => expected,
                    (None, None) => IntegerType::WIDEST,
                };
                if !ty.fits(*value) {
                    return Err(CodegenError::SemanticError(format!(
                        "literal {value} does not fit in {ty} in '{}'",
                        self.name
                    )));
                }
                let val = self.builder.ins().iconst(clif_type(ty), ty.truncate(*value));
                Ok((val, ty))
            }
            IrNode::Variable { name, .. } => {
                let &(val, ty) = self
                    .env
                    .get(name)
                    .ok_or_else(|| CodegenError::UnresolvedSymbol(name.clone()))?;
                self.check_type(&format!("'{name}'"), ty, expected)?;
                Ok((val, ty))
            }
            IrNode::BinaryOp { op, left, right } => {
                let ty = expected
                    .or_else(|| self.natural_type(node))
                    .unwrap_or(IntegerType::WIDEST);
                let (lhs, _) = self.lower_expr(left, Some(ty))?;
                let (rhs, _) = self.lower_expr(right, Some(ty))?;
                let val = match op {
                    BinaryOperator::Add => self.builder.ins().iadd(lhs, rhs),
                    BinaryOperator::Multiply => self.builder.ins().imul(lhs, rhs),
                };
                Ok((val, ty))
            }
            IrNode::Poke { address, value, ty } => {
                self.check_type("poke result", *ty, expected)?;
                self.lower_poke(address, value, *ty)
            }
            IrNode::Call { callee, args } => {
                let (val, ty) = self.lower_call(callee, args)?.ok_or_else(|| {
                    CodegenError::SemanticError(format!(
                        "'{callee}' returns None and cannot be used as a value"
                    ))
                })?;
                self.check_type(&format!("result of '{callee}'"), ty, expected)?;
                Ok((val, ty))
            }
            IrNode::Return { .. }
            | IrNode::Module(_)
            | IrNode::FunctionDef(_)
            | IrNode::EnumDecl { .. }
            | IrNode::ConstDecl { .. } => Err(CodegenError::SemanticError(format!(
                "{} is not an expression",
                node.kind_name()
            ))),
        }
    }

    /// Store `value` as a `ty`-wide integer at `address`; evaluates to the stored value.
    fn lower_poke(
        &mut self,
        address: &IrNode,
        value: &IrNode,
        ty: IntegerType,
    ) -> Result<(Value, IntegerType), CodegenError> {
        let (addr, _) = self.lower_expr(address, Some(IntegerType::WIDEST))?;
        let addr = if self.pointer_type == types::I64 {
            addr
        } else {
            self.builder.ins().ireduce(self.pointer_type, addr)
        };
        let (val, _) = self.lower_expr(value, Some(ty))?;
        self.builder.ins().store(MemFlags::new(), val, addr, 0);
        Ok((val, ty))
    }

    fn lower_call(
        &mut self,
        callee: &str,
        args: &[IrNode],
    ) -> Result<Option<(Value, IntegerType)>, CodegenError> {
        let functions = self.functions;
        let entry = functions
            .get(callee)
            .ok_or_else(|| CodegenError::UnresolvedSymbol(callee.to_string()))?;
        if entry.params.len() != args.len() {
            return Err(CodegenError::SemanticError(format!(
                "'{callee}' takes {} arguments, got {}",
                entry.params.len(),
                args.len()
            )));
        }
        let (func_id, returns) = (entry.func_id, entry.returns);

        let mut values = Vec::with_capacity(args.len());
        for (arg, &ty) in args.iter().zip(&entry.params) {
            values.push(self.lower_expr(arg, Some(ty))?.0);
        }

        let func_ref = match self.callee_refs.get(&func_id) {
            Some(&func_ref) => func_ref,
            None => {
                let func_ref = self.module.declare_func_in_func(func_id, self.builder.func);
                self.callee_refs.insert(func_id, func_ref);
                func_ref
            }
        };
        let call = self.builder.ins().call(func_ref, &values);
        Ok(match returns {
            ReturnType::Int(ty) => Some((self.builder.inst_results(call)[0], ty)),
            ReturnType::NoReturn => None,
        })
    }

    fn lower_return(&mut self, value: Option<&IrNode>) -> Result<(), CodegenError> {
        match (value, self.return_type) {
            (Some(value), ReturnType::Int(ty)) => {
                let (val, _) = self.lower_expr(value, Some(ty))?;
                self.builder.ins().return_(&[val]);
            }
            (None, ReturnType::NoReturn) => {
                self.builder.ins().return_(&[]);
            }
            (Some(_), ReturnType::NoReturn) => {
                return Err(CodegenError::SemanticError(format!(
                    "'{}' returns None but a value is returned",
                    self.name
                )))
            }
            (None, ReturnType::Int(ty)) => {
                return Err(CodegenError::SemanticError(format!(
                    "'{}' must return a value of type {ty}",
                    self.name
                )))
            }
        }
        self.terminated = true;
        Ok(())
    }

    /// Emit the implicit return and close the function.
    fn finish(mut self) {
        if !self.terminated {
            match self.return_type {
                ReturnType::NoReturn => {
                    self.builder.ins().return_(&[]);
                }
                ReturnType::Int(ty) => {
                    let zero = self.builder.ins().iconst(clif_type(ty), 0);
                    self.builder.ins().return_(&[zero]);
                }
            }
        }
        self.builder.seal_all_blocks();
        self.builder.finalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodegenContext;
    use pyaot_core::ir::{FunctionDef, Param};

    fn func(name: &str, params: &[(&str, IntegerType)], ret: ReturnType, body: Vec<IrNode>) -> IrNode {
        IrNode::FunctionDef(FunctionDef {
            name: name.to_string(),
            params: params
                .iter()
                .map(|&(n, ty)| Param { name: n.to_string(), ty })
                .collect(),
            body,
            return_type: ret,
        })
    }

    fn var(name: &str) -> IrNode {
        IrNode::Variable { name: name.to_string(), ty: None }
    }

    fn ret(value: IrNode) -> IrNode {
        IrNode::Return { value: Some(Box::new(value)) }
    }

    fn lower(body: Vec<IrNode>) -> Result<Vec<LoweredFunction>, CodegenError> {
        let mut ctx = CodegenContext::new().unwrap();
        Emitter::new(&mut ctx.module).lower_module(&ir::Module { body })
    }

    const I64: ReturnType = ReturnType::Int(IntegerType::I64);

    #[test]
    fn parameter_lowers_to_block_value() {
        let funcs = lower(vec![func("id", &[("a", IntegerType::I64)], I64, vec![ret(var("a"))])])
            .unwrap();
        assert_eq!(funcs[0].count_opcode(Opcode::Iconst), 0);
        assert_eq!(funcs[0].count_opcode(Opcode::Return), 1);
    }

    #[test]
    fn implicit_return_of_zero() {
        let funcs = lower(vec![func("z", &[], I64, vec![])]).unwrap();
        assert_eq!(funcs[0].count_opcode(Opcode::Iconst), 1);
        assert_eq!(funcs[0].count_opcode(Opcode::Return), 1);
        let funcs = lower(vec![func("n", &[], ReturnType::NoReturn, vec![])]).unwrap();
        assert_eq!(funcs[0].count_opcode(Opcode::Iconst), 0);
    }

    #[test]
    fn typed_literal_mismatch() {
        let lit = IrNode::IntegerLiteral { value: 1, ty: Some(IntegerType::I8) };
        let err = lower(vec![func("f", &[], I64, vec![ret(lit)])]).unwrap_err();
        assert!(matches!(err, CodegenError::SemanticError(ref m) if m.contains("type mismatch")));
    }

    #[test]
    fn untyped_literal_adopts_expected_width() {
        let funcs = lower(vec![func(
            "f",
            &[],
            ReturnType::Int(IntegerType::I16),
            vec![ret(IrNode::literal(0xffff))],
        )])
        .unwrap();
        assert!(funcs[0].clif_text().contains("iconst.i16"));
        let err = lower(vec![func(
            "g",
            &[],
            ReturnType::Int(IntegerType::I8),
            vec![ret(IrNode::literal(1000))],
        )])
        .unwrap_err();
        assert!(matches!(err, CodegenError::SemanticError(ref m) if m.contains("does not fit")));
    }

    #[test]
    fn variable_type_mismatch() {
        let err = lower(vec![func(
            "f",
            &[("a", IntegerType::I32)],
            I64,
            vec![ret(var("a"))],
        )])
        .unwrap_err();
        assert!(matches!(err, CodegenError::SemanticError(_)));
    }

    #[test]
    fn unknown_variable_is_unresolved() {
        let err = lower(vec![func("f", &[], I64, vec![ret(var("x"))])]).unwrap_err();
        assert!(matches!(err, CodegenError::UnresolvedSymbol(ref n) if n == "x"));
    }

    #[test]
    fn forward_call_is_unresolved_but_backward_call_works() {
        let call_g = IrNode::Call { callee: "g".into(), args: vec![] };
        let err = lower(vec![
            func("f", &[], I64, vec![ret(call_g.clone())]),
            func("g", &[], I64, vec![ret(IrNode::literal(1))]),
        ])
        .unwrap_err();
        assert!(matches!(err, CodegenError::UnresolvedSymbol(ref n) if n == "g"));

        let funcs = lower(vec![
            func("g", &[], I64, vec![ret(IrNode::literal(1))]),
            func("f", &[], I64, vec![ret(call_g)]),
        ])
        .unwrap();
        assert_eq!(funcs[1].count_opcode(Opcode::Call), 1);
    }

    #[test]
    fn self_recursion_resolves() {
        let call = IrNode::Call { callee: "f".into(), args: vec![var("a")] };
        let funcs = lower(vec![func("f", &[("a", IntegerType::I64)], I64, vec![ret(call)])])
            .unwrap();
        assert_eq!(funcs[0].count_opcode(Opcode::Call), 1);
    }

    #[test]
    fn call_arity_and_void_results_checked() {
        let noop = func("noop", &[], ReturnType::NoReturn, vec![]);
        let err = lower(vec![
            noop.clone(),
            func("f", &[], I64, vec![ret(IrNode::Call { callee: "noop".into(), args: vec![] })]),
        ])
        .unwrap_err();
        assert!(matches!(err, CodegenError::SemanticError(ref m) if m.contains("returns None")));

        let err = lower(vec![
            noop.clone(),
            func(
                "f",
                &[],
                ReturnType::NoReturn,
                vec![IrNode::Call { callee: "noop".into(), args: vec![IrNode::literal(1)] }],
            ),
        ])
        .unwrap_err();
        assert!(matches!(err, CodegenError::SemanticError(ref m) if m.contains("arguments")));

        lower(vec![
            noop,
            func(
                "f",
                &[],
                ReturnType::NoReturn,
                vec![IrNode::Call { callee: "noop".into(), args: vec![] }],
            ),
        ])
        .unwrap();
    }

    #[test]
    fn statements_after_return_rejected() {
        let err = lower(vec![func(
            "f",
            &[],
            I64,
            vec![ret(IrNode::literal(1)), ret(IrNode::literal(2))],
        )])
        .unwrap_err();
        assert!(matches!(err, CodegenError::SemanticError(ref m) if m.contains("unreachable")));
    }

    #[test]
    fn duplicate_function_and_module_level_code_rejected() {
        let f = func("f", &[], ReturnType::NoReturn, vec![]);
        assert!(matches!(lower(vec![f.clone(), f]), Err(CodegenError::SemanticError(_))));
        assert!(matches!(lower(vec![IrNode::literal(1)]), Err(CodegenError::SemanticError(_))));
        lower(vec![IrNode::ConstDecl { name: "K".into() }]).unwrap();
    }

    #[test]
    fn poke_stores_at_declared_width() {
        let poke = IrNode::Poke {
            address: Box::new(var("p")),
            value: Box::new(IrNode::literal(0xab)),
            ty: IntegerType::I8,
        };
        let funcs = lower(vec![func("f", &[("p", IntegerType::I64)], ReturnType::NoReturn, vec![poke])])
            .unwrap();
        assert_eq!(funcs[0].count_opcode(Opcode::Store), 1);
        assert!(funcs[0].clif_text().contains("iconst.i8"));
    }
}
