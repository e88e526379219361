//! Source text to generic syntax tree.

pub mod lexer;
pub mod parser;
pub mod tokens;
