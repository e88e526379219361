//! AOT (Ahead-Of-Time) compilation to native object files.

use std::path::Path;

use cranelift_object::ObjectModule;
use pyaot_core::ir::Module;

use crate::context::{CodegenContext, CodegenOptions};
use crate::emit::{emit_object, emit_to_file, CodegenError};
use crate::lower::{Emitter, LoweredFunction};

/// A fully lowered module, ready for emission.
pub struct BackendModule {
    pub object: ObjectModule,
    /// One entry per function, in source order.
    pub functions: Vec<LoweredFunction>,
}

impl BackendModule {
    /// CLIF text of every function.
    pub fn clif_text(&self) -> String {
        self.functions.iter().map(LoweredFunction::clif_text).collect::<Vec<_>>().join("\n")
    }

    pub fn function(&self, name: &str) -> Option<&LoweredFunction> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Finish the module and return the object bytes.
    pub fn emit(self) -> Result<Vec<u8>, CodegenError> {
        emit_object(self.object)
    }

    /// Finish the module and write the object file to `path`.
    pub fn emit_to_file(self, path: &Path) -> Result<(), CodegenError> {
        emit_to_file(self.object, path)
    }
}

/// Lower an IR module into the context's object module.
pub fn lower(ir: &Module, ctx: CodegenContext) -> Result<BackendModule, CodegenError> {
    let CodegenContext { module: mut object, .. } = ctx;
    let functions = Emitter::new(&mut object).lower_module(ir)?;
    Ok(BackendModule { object, functions })
}

pub struct ObjectArtifact {
    pub bytes: Vec<u8>,
    pub functions: Vec<LoweredFunction>,
}

/// Compile an IR module straight to object bytes.
pub fn compile_object(ir: &Module, options: &CodegenOptions) -> Result<ObjectArtifact, CodegenError> {
    let backend = lower(ir, CodegenContext::from_options(options)?)?;
    let functions = backend.functions.clone();
    let bytes = backend.emit()?;
    Ok(ObjectArtifact { bytes, functions })
}
