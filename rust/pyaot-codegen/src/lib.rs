//! Pyaot native code generation via Cranelift.
//!
//! Lowers typed IR modules to relocatable object files.

pub mod aot;
pub mod context;
pub mod emit;
pub mod lower;
pub mod types;

pub use aot::{compile_object, lower, BackendModule, ObjectArtifact};
pub use context::{CodegenContext, CodegenOptions, OptLevel};
pub use emit::CodegenError;
