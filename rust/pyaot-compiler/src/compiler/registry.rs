//! Builder registry: dispatch table from syntax kinds to IR builders.
//!
//! Each IR variant is described by a [`NodeDescriptor`] naming the syntax
//! kinds it can be derived from and whether it is the *default* builder for
//! those kinds. The registry groups descriptors per kind into an ordered list
//! of candidates, tried first, and at most one default, tried last.
//!
//! Adding a subset feature means adding a descriptor to
//! [`builders::NODE_DESCRIPTORS`](super::builders::NODE_DESCRIPTORS).

use std::collections::HashMap;

use once_cell::sync::OnceCell;
use pyaot_core::ir::IrNode;
use pyaot_core::syntax::{SyntaxKind, SyntaxNode};
use thiserror::Error;

use super::builders::NODE_DESCRIPTORS;
use super::error::TranslateError;
use super::translate::Translator;

// ── Descriptors ──────────────────────────────────────────────────────

/// Result of a builder that accepted its input.
#[derive(Debug, Clone, PartialEq)]
pub enum Built {
    Node(IrNode),
    /// The construct produces nothing and is dropped from its sequence.
    Elided,
}

/// A builder returns `Ok(None)` when it does not apply to this particular node.
pub type BuildFn = fn(&SyntaxNode, &mut Translator<'_>) -> Result<Option<Built>, TranslateError>;

#[derive(Clone, Copy)]
pub struct NodeDescriptor {
    pub name: &'static str,
    pub derived_from: &'static [SyntaxKind],
    pub default: bool,
    pub build: BuildFn,
}

impl std::fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("name", &self.name)
            .field("derived_from", &self.derived_from)
            .field("default", &self.default)
            .finish()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("both '{first}' and '{second}' claim to be the default builder for {kind}")]
    DuplicateDefault { kind: SyntaxKind, first: &'static str, second: &'static str },
}

// ── Registry ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct BuilderRegistry {
    candidates: HashMap<SyntaxKind, Vec<NodeDescriptor>>,
    defaults: HashMap<SyntaxKind, NodeDescriptor>,
}

static BUILTIN: OnceCell<BuilderRegistry> = OnceCell::new();

impl BuilderRegistry {
    /// Group descriptors by kind, preserving registration order.
    ///
    /// Returns `Err(RegistryError::DuplicateDefault)` if two descriptors are
    /// the default for the same kind.
    pub fn from_descriptors(descriptors: &[NodeDescriptor]) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        for desc in descriptors {
            for &kind in desc.derived_from {
                if desc.default {
                    if let Some(existing) = registry.defaults.get(&kind) {
                        return Err(RegistryError::DuplicateDefault {
                            kind,
                            first: existing.name,
                            second: desc.name,
                        });
                    }
                    registry.defaults.insert(kind, *desc);
                } else {
                    registry.candidates.entry(kind).or_default().push(*desc);
                }
            }
        }
        Ok(registry)
    }

    /// The registry of every built-in IR variant, constructed on first use.
    pub fn builtin() -> Result<&'static BuilderRegistry, RegistryError> {
        BUILTIN.get_or_try_init(|| Self::from_descriptors(NODE_DESCRIPTORS))
    }

    pub fn candidates(&self, kind: SyntaxKind) -> &[NodeDescriptor] {
        self.candidates.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn default_for(&self, kind: SyntaxKind) -> Option<&NodeDescriptor> {
        self.defaults.get(&kind)
    }

    /// Candidates in order plus the optional default.
    pub fn lookup(&self, kind: SyntaxKind) -> (&[NodeDescriptor], Option<&NodeDescriptor>) {
        (self.candidates(kind), self.default_for(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &SyntaxNode, _: &mut Translator<'_>) -> Result<Option<Built>, TranslateError> {
        Ok(None)
    }

    fn desc(name: &'static str, kinds: &'static [SyntaxKind], default: bool) -> NodeDescriptor {
        NodeDescriptor { name, derived_from: kinds, default, build: never }
    }

    #[test]
    fn candidates_keep_registration_order() {
        let registry = BuilderRegistry::from_descriptors(&[
            desc("a", &[SyntaxKind::Call], false),
            desc("b", &[SyntaxKind::Call, SyntaxKind::Name], false),
            desc("c", &[SyntaxKind::Call], true),
        ])
        .unwrap();
        let (candidates, default) = registry.lookup(SyntaxKind::Call);
        let names: Vec<_> = candidates.iter().map(|d| d.name).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(default.map(|d| d.name), Some("c"));
        assert_eq!(registry.candidates(SyntaxKind::Name).len(), 1);
        assert!(registry.default_for(SyntaxKind::Name).is_none());
        assert!(registry.candidates(SyntaxKind::ClassDef).is_empty());
    }

    #[test]
    fn two_defaults_for_one_kind_rejected() {
        let err = BuilderRegistry::from_descriptors(&[
            desc("first", &[SyntaxKind::Name], true),
            desc("second", &[SyntaxKind::Name], true),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateDefault { kind: SyntaxKind::Name, first: "first", second: "second" }
        );
    }

    #[test]
    fn builtin_registry_is_consistent() {
        let registry = BuilderRegistry::builtin().unwrap();
        assert!(registry.default_for(SyntaxKind::Call).is_some());
        assert!(registry.default_for(SyntaxKind::ClassDef).is_none());
        assert!(!registry.candidates(SyntaxKind::ClassDef).is_empty());
        assert!(registry.default_for(SyntaxKind::UnaryOp).is_none());
        assert!(registry.candidates(SyntaxKind::UnaryOp).is_empty());
    }
}
