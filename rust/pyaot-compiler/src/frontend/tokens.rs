use pyaot_core::syntax::Span;
use std::fmt;

/// Token types for the Python subset
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    IntLit(i64),
    StringLit(String),

    // Identifiers
    Ident(String),

    // Keywords
    Def,
    Class,
    Return,
    Pass,
    None,
    True,
    False,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    DoubleSlash, // //
    Percent,
    Assign, // =
    Arrow,  // ->
    Dot,
    Comma,
    Colon,
    At,

    // Delimiters
    LParen,
    RParen,

    // Indentation
    Indent,
    Dedent,
    Newline,

    // Special
    Eof,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::IntLit(n) => write!(f, "{}", n),
            TokenKind::StringLit(s) => write!(f, "{:?}", s),
            TokenKind::Ident(s) => write!(f, "{}", s),
            TokenKind::Def => write!(f, "def"),
            TokenKind::Class => write!(f, "class"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::Pass => write!(f, "pass"),
            TokenKind::None => write!(f, "None"),
            TokenKind::True => write!(f, "True"),
            TokenKind::False => write!(f, "False"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::DoubleSlash => write!(f, "//"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::At => write!(f, "@"),
            TokenKind::LParen => write!(f, "("),
            TokenKind::RParen => write!(f, ")"),
            TokenKind::Indent => write!(f, "INDENT"),
            TokenKind::Dedent => write!(f, "DEDENT"),
            TokenKind::Newline => write!(f, "NEWLINE"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}
