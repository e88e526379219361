//! Pyaot Core
//!
//! Shared types used across the translator and the native backend: the generic
//! syntax tree handed over by the parser, and the typed IR produced from it.

pub mod ir;
pub mod syntax;
