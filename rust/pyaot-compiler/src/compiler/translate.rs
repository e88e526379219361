//! Syntax tree to IR translation.
//!
//! The [`Translator`] walks the tree depth-first. For every node it tries the
//! registry's candidate builders for that kind in order, then the default
//! builder, and fails with [`TranslateError::SyntaxUnsupported`] when nothing
//! accepts the node.

use std::collections::HashMap;

use log::trace;
use pyaot_core::ir::{IntegerType, IrNode, Module};
use pyaot_core::syntax::SyntaxNode;

use super::constants::ConstantTable;
use super::error::TranslateError;
use super::registry::{BuilderRegistry, Built};

/// Translation state for one compilation.
pub struct Translator<'r> {
    registry: &'r BuilderRegistry,
    constants: ConstantTable,
    /// Parameter types of the function being translated.
    scope: Option<HashMap<String, IntegerType>>,
}

impl<'r> Translator<'r> {
    pub fn new(registry: &'r BuilderRegistry) -> Self {
        Self { registry, constants: ConstantTable::new(), scope: None }
    }

    /// Dispatch one node through the registry.
    pub fn visit(&mut self, node: &SyntaxNode) -> Result<Built, TranslateError> {
        let kind = node.kind();
        let registry = self.registry;
        let (candidates, default) = registry.lookup(kind);
        for desc in candidates.iter().chain(default) {
            trace!("trying builder '{}' for {} at {}", desc.name, kind, node.span);
            if let Some(built) = (desc.build)(node, self)? {
                return Ok(built);
            }
        }
        Err(TranslateError::unsupported(kind, node.span))
    }

    /// Visit a node that must produce a value.
    pub fn visit_expr(&mut self, node: &SyntaxNode) -> Result<IrNode, TranslateError> {
        match self.visit(node)? {
            Built::Node(ir) => Ok(ir),
            Built::Elided => Err(TranslateError::semantic(
                format!("{} does not produce a value", node.kind()),
                node.span,
            )),
        }
    }

    /// Visit a statement sequence, dropping elided nodes.
    pub fn visit_seq(&mut self, nodes: &[SyntaxNode]) -> Result<Vec<IrNode>, TranslateError> {
        let mut out = Vec::with_capacity(nodes.len());
        for node in nodes {
            if let Built::Node(ir) = self.visit(node)? {
                out.push(ir);
            }
        }
        Ok(out)
    }

    pub fn in_function(&self) -> bool {
        self.scope.is_some()
    }

    pub fn enter_function(&mut self, params: HashMap<String, IntegerType>) {
        self.scope = Some(params);
    }

    pub fn exit_function(&mut self) {
        self.scope = None;
    }

    /// Declared type of `name` if it is a parameter of the current function.
    pub fn param_type(&self, name: &str) -> Option<IntegerType> {
        self.scope.as_ref().and_then(|s| s.get(name).copied())
    }

    pub fn constants(&self) -> &ConstantTable {
        &self.constants
    }

    pub fn constants_mut(&mut self) -> &mut ConstantTable {
        &mut self.constants
    }
}

/// Translate a syntax tree with the built-in registry.
pub fn translate(tree: &SyntaxNode) -> Result<IrNode, TranslateError> {
    let registry = BuilderRegistry::builtin()?;
    Translator::new(registry).visit_expr(tree)
}

/// Translate a whole source module.
pub fn translate_module(tree: &SyntaxNode) -> Result<Module, TranslateError> {
    match translate(tree)? {
        IrNode::Module(module) => Ok(module),
        _ => Err(TranslateError::unsupported(tree.kind(), tree.span)),
    }
}
