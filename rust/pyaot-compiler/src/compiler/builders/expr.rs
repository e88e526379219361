use pyaot_core::ir::{BinaryOperator, IrNode};
use pyaot_core::syntax::{BinOperator, ConstantValue, Node, SyntaxKind, SyntaxNode};

use crate::compiler::error::TranslateError;
use crate::compiler::registry::Built;
use crate::compiler::translate::Translator;

type BuildResult = Result<Option<Built>, TranslateError>;

fn produced(node: IrNode) -> BuildResult {
    Ok(Some(Built::Node(node)))
}

/// Literals, integer constants and `Enum.MEMBER` references that resolve at
/// translation time. Anything else is left to a lower-priority builder.
pub(super) fn build_integer_literal(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    match &node.node {
        Node::Constant { value: ConstantValue::Int(n) } => produced(IrNode::literal(*n)),
        Node::Constant { value: ConstantValue::Str(s) } => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => produced(IrNode::literal(c as i64)),
                _ => Ok(None),
            }
        }
        Node::Name { id } => match tx.constants().integer(id) {
            Ok(Some(value)) => produced(IrNode::literal(value)),
            Ok(None) => Ok(None),
            Err(e) => Err(TranslateError::semantic(e.to_string(), node.span)),
        },
        Node::Attribute { value, attr } => {
            let Some(base) = value.as_name() else { return Ok(None) };
            tx.constants()
                .enum_member(base, attr)
                .map(|v| Some(Built::Node(IrNode::literal(v))))
                .map_err(|e| TranslateError::semantic(e.to_string(), node.span))
        }
        _ => Ok(None),
    }
}

pub(super) fn build_variable(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Name { id } = &node.node else { return Ok(None) };
    produced(IrNode::Variable { name: id.clone(), ty: tx.param_type(id) })
}

pub(super) fn build_binary_op(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::BinOp { left, op, right } = &node.node else { return Ok(None) };
    let op = match op {
        BinOperator::Add => BinaryOperator::Add,
        BinOperator::Mult => BinaryOperator::Multiply,
        other => {
            return Err(TranslateError::NotImplementedOperation {
                op: other.to_string(),
                span: node.span,
            })
        }
    };
    let left = tx.visit_expr(left)?;
    let right = tx.visit_expr(right)?;
    let folded = IrNode::binary(op, left, right)
        .map_err(|err| TranslateError::semantic(err.to_string(), node.span))?;
    produced(folded)
}

/// Plain call to a named function. Arity and types are checked during lowering.
pub(super) fn build_function_call(node: &SyntaxNode, tx: &mut Translator<'_>) -> BuildResult {
    let Node::Call { func, args, keywords } = &node.node else { return Ok(None) };
    let Some(callee) = func.as_name() else {
        return Err(TranslateError::unsupported(SyntaxKind::Call, node.span));
    };
    if let Some(kw) = keywords.first() {
        return Err(TranslateError::semantic(
            format!("keyword argument '{}' in call to '{callee}' is not supported", kw.arg),
            kw.span,
        ));
    }
    let args = args.iter().map(|a| tx.visit_expr(a)).collect::<Result<Vec<_>, _>>()?;
    produced(IrNode::Call { callee: callee.to_string(), args })
}
