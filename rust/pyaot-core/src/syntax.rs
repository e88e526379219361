//! Generic syntax tree for the annotated Python subset.
//!
//! This is the parser's output and the translator's input. It mirrors the
//! shape of a conventional Python AST: every construct is a [`SyntaxNode`]
//! whose [`SyntaxKind`] tag drives builder dispatch.

use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{Display, EnumIter};

/// Source location in the original `.py` file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Byte offset of the start in the source
    pub start: usize,
    /// Byte offset of the end (exclusive) in the source
    pub end: usize,
    /// 1-based line number
    pub line: usize,
    /// 1-based column number
    pub col: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, col: usize) -> Self {
        Self { start, end, line, col }
    }

    pub fn dummy() -> Self {
        Self { start: 0, end: 0, line: 0, col: 0 }
    }

    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            line: self.line.min(other.line),
            col: if self.line <= other.line { self.col } else { other.col },
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, col {}", self.line, self.col)
    }
}

/// Tag identifying the kind of a syntax node.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
pub enum SyntaxKind {
    Module,
    FunctionDef,
    ClassDef,
    Return,
    Assign,
    Expr,
    Pass,
    Name,
    Constant,
    Attribute,
    BinOp,
    UnaryOp,
    Call,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum BinOperator {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mult,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "//")]
    FloorDiv,
    #[strum(serialize = "%")]
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum UnaryOperator {
    #[strum(serialize = "-")]
    USub,
    #[strum(serialize = "+")]
    UAdd,
}

/// Literal payload of a `Constant` node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConstantValue {
    Int(i64),
    Str(String),
    Bool(bool),
    None,
}

/// A function parameter with its (optional) annotation expression.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Arg {
    pub name: String,
    pub annotation: Option<SyntaxNode>,
    pub span: Span,
}

/// A `name=value` argument in a call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub arg: String,
    pub value: SyntaxNode,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Module {
        body: Vec<SyntaxNode>,
    },
    FunctionDef {
        name: String,
        args: Vec<Arg>,
        body: Vec<SyntaxNode>,
        returns: Option<Box<SyntaxNode>>,
        decorators: Vec<SyntaxNode>,
    },
    ClassDef {
        name: String,
        bases: Vec<SyntaxNode>,
        body: Vec<SyntaxNode>,
        decorators: Vec<SyntaxNode>,
    },
    Return {
        value: Option<Box<SyntaxNode>>,
    },
    Assign {
        targets: Vec<SyntaxNode>,
        value: Box<SyntaxNode>,
    },
    /// An expression used as a statement.
    Expr {
        value: Box<SyntaxNode>,
    },
    Pass,
    Name {
        id: String,
    },
    Constant {
        value: ConstantValue,
    },
    Attribute {
        value: Box<SyntaxNode>,
        attr: String,
    },
    BinOp {
        left: Box<SyntaxNode>,
        op: BinOperator,
        right: Box<SyntaxNode>,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<SyntaxNode>,
    },
    Call {
        func: Box<SyntaxNode>,
        args: Vec<SyntaxNode>,
        keywords: Vec<Keyword>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    pub node: Node,
    pub span: Span,
}

impl SyntaxNode {
    pub fn new(node: Node, span: Span) -> Self {
        Self { node, span }
    }

    pub fn kind(&self) -> SyntaxKind {
        match &self.node {
            Node::Module { .. } => SyntaxKind::Module,
            Node::FunctionDef { .. } => SyntaxKind::FunctionDef,
            Node::ClassDef { .. } => SyntaxKind::ClassDef,
            Node::Return { .. } => SyntaxKind::Return,
            Node::Assign { .. } => SyntaxKind::Assign,
            Node::Expr { .. } => SyntaxKind::Expr,
            Node::Pass => SyntaxKind::Pass,
            Node::Name { .. } => SyntaxKind::Name,
            Node::Constant { .. } => SyntaxKind::Constant,
            Node::Attribute { .. } => SyntaxKind::Attribute,
            Node::BinOp { .. } => SyntaxKind::BinOp,
            Node::UnaryOp { .. } => SyntaxKind::UnaryOp,
            Node::Call { .. } => SyntaxKind::Call,
        }
    }

    /// The identifier if this node is a bare `Name`.
    pub fn as_name(&self) -> Option<&str> {
        match &self.node {
            Node::Name { id } => Some(id),
            _ => None,
        }
    }

    /// The value if this node is an integer `Constant`.
    pub fn as_int(&self) -> Option<i64> {
        match &self.node {
            Node::Constant { value: ConstantValue::Int(n) } => Some(*n),
            _ => None,
        }
    }

    /// Serialize the tree as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
