use pyaot_core::syntax::{Span, SyntaxKind};
use thiserror::Error;

use super::registry::RegistryError;

/// Errors raised while turning a syntax tree into IR. All are fatal.
#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("unsupported syntax: {kind} at {span}")]
    SyntaxUnsupported { kind: SyntaxKind, span: Span },
    #[error("semantic error: {detail} at {span}")]
    Semantic { detail: String, span: Span },
    #[error("operation not implemented: {op} at {span}")]
    NotImplementedOperation { op: String, span: Span },
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl TranslateError {
    pub fn semantic(detail: impl Into<String>, span: Span) -> Self {
        TranslateError::Semantic { detail: detail.into(), span }
    }

    pub fn unsupported(kind: SyntaxKind, span: Span) -> Self {
        TranslateError::SyntaxUnsupported { kind, span }
    }
}
