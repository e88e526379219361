//! Builders for every IR variant and the descriptor table that registers them.

mod expr;
mod intrinsics;
mod stmt;

use pyaot_core::syntax::SyntaxKind;

use super::registry::NodeDescriptor;

pub use intrinsics::{CONST_INTRINSIC, POKE_PREFIX};
pub use stmt::ENUM_DECORATOR;

/// Every built-in IR variant. Candidates for a kind are tried in the order
/// they appear here.
pub static NODE_DESCRIPTORS: &[NodeDescriptor] = &[
    NodeDescriptor {
        name: "module",
        derived_from: &[SyntaxKind::Module],
        default: true,
        build: stmt::build_module,
    },
    NodeDescriptor {
        name: "function_def",
        derived_from: &[SyntaxKind::FunctionDef],
        default: true,
        build: stmt::build_function_def,
    },
    NodeDescriptor {
        name: "return",
        derived_from: &[SyntaxKind::Return],
        default: true,
        build: stmt::build_return,
    },
    NodeDescriptor {
        name: "expression_statement",
        derived_from: &[SyntaxKind::Expr],
        default: true,
        build: stmt::build_expr_statement,
    },
    NodeDescriptor {
        name: "pass",
        derived_from: &[SyntaxKind::Pass],
        default: true,
        build: stmt::build_pass,
    },
    NodeDescriptor {
        name: "integer_literal",
        derived_from: &[SyntaxKind::Constant, SyntaxKind::Name, SyntaxKind::Attribute],
        default: false,
        build: expr::build_integer_literal,
    },
    NodeDescriptor {
        name: "variable",
        derived_from: &[SyntaxKind::Name],
        default: true,
        build: expr::build_variable,
    },
    NodeDescriptor {
        name: "binary_op",
        derived_from: &[SyntaxKind::BinOp],
        default: true,
        build: expr::build_binary_op,
    },
    NodeDescriptor {
        name: "poke",
        derived_from: &[SyntaxKind::Call],
        default: false,
        build: intrinsics::build_poke,
    },
    NodeDescriptor {
        name: "const_decl",
        derived_from: &[SyntaxKind::Call],
        default: false,
        build: intrinsics::build_const_decl,
    },
    NodeDescriptor {
        name: "typed_literal",
        derived_from: &[SyntaxKind::Call],
        default: false,
        build: intrinsics::build_typed_literal,
    },
    NodeDescriptor {
        name: "function_call",
        derived_from: &[SyntaxKind::Call],
        default: true,
        build: expr::build_function_call,
    },
    NodeDescriptor {
        name: "enum_decl",
        derived_from: &[SyntaxKind::ClassDef],
        default: false,
        build: stmt::build_enum_decl,
    },
];
