//! Pyaot Compiler
//!
//! Turns Python-subset source text into the typed IR defined in `pyaot-core`:
//! the frontend builds a generic syntax tree, and the registry-driven
//! translator maps it onto IR nodes, folding constants as it goes.

pub mod compiler;
pub mod frontend;

use pyaot_core::ir::Module;
use pyaot_core::syntax::SyntaxNode;
use thiserror::Error;

pub use compiler::constants::{ConstantError, ConstantTable};
pub use compiler::error::TranslateError;
pub use compiler::registry::{BuilderRegistry, RegistryError};
pub use compiler::translate::{translate, translate_module, Translator};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("lex error: {0}")]
    Lex(#[from] frontend::lexer::LexError),
    #[error("parse error: {0}")]
    Parse(#[from] frontend::parser::ParseError),
    #[error("{0}")]
    Translate(#[from] TranslateError),
}

/// Lex and parse source text into a syntax tree.
pub fn parse(source: &str) -> Result<SyntaxNode, CompileError> {
    let tokens = frontend::lexer::Lexer::new(source).tokenize()?;
    let tree = frontend::parser::Parser::new(tokens).parse_module()?;
    Ok(tree)
}

/// Compile source text to an IR module.
pub fn compile(source: &str) -> Result<Module, CompileError> {
    let tree = parse(source)?;
    let module = translate_module(&tree)?;
    log::debug!("translated module with {} top-level nodes", module.body.len());
    Ok(module)
}
