//! Call-shaped intrinsics recognised by name: `pokeN`, `const` and `intN`.

use log::debug;
use pyaot_core::ir::{IntegerType, IrNode};
use pyaot_core::syntax::{Node, SyntaxNode};

use crate::compiler::error::TranslateError;
use crate::compiler::registry::Built;
use crate::compiler::translate::Translator;

pub const POKE_PREFIX: &str = "poke";
/// Constant declarations use this exact callee name.
pub const CONST_INTRINSIC: &str = "const";

type BuildResult = Result<Option<Built>, TranslateError>;

fn callee(node: &SyntaxNode) -> Option<&str> {
    match &node.node {
        Node::Call { func, .. } => func.as_name(),
        _ => None,
    }
}

/// `pokeN(address, value)` stores `value` as an N-bit integer at `address`.
pub(super) fn build_poke(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Call { args, keywords, .. } = &node.node else { return Ok(None) };
    let Some(name) = callee(node) else { return Ok(None) };
    let Some(suffix) = name.strip_prefix(POKE_PREFIX) else { return Ok(None) };
    // `poker()` and friends are ordinary calls.
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }
    let ty = suffix.parse().ok().and_then(IntegerType::from_bits).ok_or_else(|| {
        TranslateError::semantic(format!("invalid poke width {suffix} in '{name}'"), node.span)
    })?;
    if args.len() != 2 || !keywords.is_empty() {
        return Err(TranslateError::semantic(
            format!(
                "'{name}' takes exactly 2 positional arguments (address, value), got {}",
                args.len() + keywords.len()
            ),
            node.span,
        ));
    }
    let address = tx.visit_expr(&args[0])?;
    let value = tx.visit_expr(&args[1])?;
    Ok(Some(Built::Node(IrNode::Poke { address: Box::new(address), value: Box::new(value), ty })))
}

/// `const(NAME=value)` declares an integer constant. The value may be any
/// expression that folds to a literal, including other constants.
pub(super) fn build_const_decl(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Call { args, keywords, .. } = &node.node else { return Ok(None) };
    let Some(name) = callee(node) else { return Ok(None) };
    if name != CONST_INTRINSIC {
        return Ok(None);
    }
    let kw = match (args.as_slice(), keywords.as_slice()) {
        ([], [kw]) => kw,
        _ => {
            return Err(TranslateError::semantic(
                format!("'{name}' takes exactly one keyword argument"),
                node.span,
            ))
        }
    };
    let value = tx.visit_expr(&kw.value)?.as_literal().ok_or_else(|| {
        TranslateError::semantic(
            format!("value of constant '{}' must be an integer", kw.arg),
            kw.value.span,
        )
    })?;
    tx.constants_mut()
        .define_integer(&kw.arg, value)
        .map_err(|e| TranslateError::semantic(e.to_string(), kw.span))?;
    debug!("declared constant '{}' = {value}", kw.arg);
    Ok(Some(Built::Node(IrNode::ConstDecl { name: kw.arg.clone() })))
}

/// `int8(v)` .. `int64(v)` gives a constant an explicit type.
pub(super) fn build_typed_literal(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Call { args, keywords, .. } = &node.node else { return Ok(None) };
    let Some(ty) = callee(node).and_then(IntegerType::from_annotation) else { return Ok(None) };
    let arg = match (args.as_slice(), keywords.is_empty()) {
        ([arg], true) => arg,
        _ => {
            return Err(TranslateError::semantic(
                format!("'{ty}' takes exactly one argument"),
                node.span,
            ))
        }
    };
    let value = tx.visit_expr(arg)?.as_literal().ok_or_else(|| {
        TranslateError::semantic(format!("'{ty}' requires a constant integer argument"), arg.span)
    })?;
    if !ty.fits(value) {
        return Err(TranslateError::semantic(
            format!("value {value} does not fit in {ty}"),
            arg.span,
        ));
    }
    Ok(Some(Built::Node(IrNode::IntegerLiteral { value, ty: Some(ty) })))
}
