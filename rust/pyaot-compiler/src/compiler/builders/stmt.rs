use std::collections::{BTreeMap, HashMap};

use log::debug;
use pyaot_core::ir::{FunctionDef, IntegerType, IrNode, Module, Param, ReturnType};
use pyaot_core::syntax::{ConstantValue, Node, SyntaxNode};

use crate::compiler::error::TranslateError;
use crate::compiler::registry::Built;
use crate::compiler::translate::Translator;

/// Decorator marking a class as an enumeration.
pub const ENUM_DECORATOR: &str = "enum";

type BuildResult = Result<Option<Built>, TranslateError>;

fn produced(node: IrNode) -> BuildResult {
    Ok(Some(Built::Node(node)))
}

pub(super) fn build_module(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Module { body } = &node.node else { return Ok(None) };
    let body = tx.visit_seq(body)?;
    produced(IrNode::Module(Module { body }))
}

fn return_type(
    returns: Option<&SyntaxNode>,
    fn_name: &str,
    node: &SyntaxNode,
) -> Result<ReturnType, TranslateError> {
    let invalid = || {
        TranslateError::semantic(format!("invalid return type for function '{fn_name}'"), node.span)
    };
    let returns = returns.ok_or_else(invalid)?;
    match &returns.node {
        Node::Constant { value: ConstantValue::None } => Ok(ReturnType::NoReturn),
        Node::Name { id } => {
            IntegerType::from_annotation(id).map(ReturnType::Int).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

pub(super) fn build_function_def(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::FunctionDef { name, args, body, returns, decorators } = &node.node else {
        return Ok(None);
    };
    if tx.in_function() {
        return Err(TranslateError::semantic(
            format!("nested function '{name}' is not supported"),
            node.span,
        ));
    }
    if let Some(decorator) = decorators.first() {
        return Err(TranslateError::semantic(
            format!("decorators are not supported on function '{name}'"),
            decorator.span,
        ));
    }

    let mut params = Vec::with_capacity(args.len());
    let mut scope = HashMap::new();
    for arg in args {
        let ty = arg
            .annotation
            .as_ref()
            .and_then(|a| a.as_name())
            .and_then(IntegerType::from_annotation)
            .ok_or_else(|| {
                TranslateError::semantic(
                    format!("missing or invalid type for parameter '{}' of '{name}'", arg.name),
                    arg.span,
                )
            })?;
        if scope.insert(arg.name.clone(), ty).is_some() {
            return Err(TranslateError::semantic(
                format!("duplicate parameter '{}' in '{name}'", arg.name),
                arg.span,
            ));
        }
        params.push(Param { name: arg.name.clone(), ty });
    }
    let return_type = return_type(returns.as_deref(), name, node)?;

    tx.enter_function(scope);
    let body = tx.visit_seq(body);
    tx.exit_function();
    let body = body?;

    debug!("translated function '{name}' ({} params, returns {return_type})", params.len());
    produced(IrNode::FunctionDef(FunctionDef { name: name.clone(), params, body, return_type }))
}

pub(super) fn build_return(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Return { value } = &node.node else { return Ok(None) };
    let value = match value {
        Some(v) => Some(Box::new(tx.visit_expr(v)?)),
        None => None,
    };
    produced(IrNode::Return { value })
}

/// Expression statements are transparent: they yield whatever the inner
/// expression builds.
pub(super) fn build_expr_statement(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Expr { value } = &node.node else { return Ok(None) };
    tx.visit(value).map(Some)
}

pub(super) fn build_pass(node: &SyntaxNode, _tx: &mut Translator<'_>) -> BuildResult {
    match node.node {
        Node::Pass => Ok(Some(Built::Elided)),
        _ => Ok(None),
    }
}

/// `@enum class Name:` with a body of `MEMBER = <integer>` lines.
pub(super) fn build_enum_decl(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::ClassDef { name, bases, body, decorators } = &node.node else { return Ok(None) };
    match decorators.as_slice() {
        [only] if only.as_name() == Some(ENUM_DECORATOR) => {}
        _ => return Ok(None),
    }
    if let Some(base) = bases.first() {
        return Err(TranslateError::semantic(
            format!("enum '{name}' may not have base classes"),
            base.span,
        ));
    }

    let mut members = BTreeMap::new();
    for stmt in body {
        let Node::Assign { targets, value } = &stmt.node else {
            return Err(TranslateError::semantic(
                format!("enum '{name}' may only contain member assignments"),
                stmt.span,
            ));
        };
        let member = match targets.as_slice() {
            [target] => target.as_name(),
            _ => None,
        }
        .ok_or_else(|| {
            TranslateError::semantic(
                format!("enum '{name}' members must be assigned to a single name"),
                stmt.span,
            )
        })?;
        let value = value.as_int().ok_or_else(|| {
            TranslateError::semantic(
                format!("value of '{name}.{member}' must be an integer literal"),
                value.span,
            )
        })?;
        if members.insert(member.to_string(), value).is_some() {
            return Err(TranslateError::semantic(
                format!("duplicate member '{member}' in enum '{name}'"),
                stmt.span,
            ));
        }
    }

    debug!("declared enum '{name}' with {} members", members.len());
    tx.constants_mut()
        .define_enum(name, members)
        .map_err(|e| TranslateError::semantic(e.to_string(), node.span))?;
    produced(IrNode::EnumDecl { name: name.clone() })
}
