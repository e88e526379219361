//! Object file emission.
//!
//! Converts the compiled Cranelift module into a native object file (.o).

use std::path::Path;

use cranelift_object::ObjectModule;
use thiserror::Error;

/// Errors that can occur during code generation.
#[derive(Debug, Error)]
pub enum CodegenError {
    #[error("target error: {0}")]
    TargetError(String),

    #[error("semantic error: {0}")]
    SemanticError(String),

    #[error("unresolved symbol: '{0}'")]
    UnresolvedSymbol(String),

    #[error("lowering error: {0}")]
    LoweringError(String),

    #[error("emission error: {0}")]
    EmissionError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Finish the module and return the raw object file bytes.
pub fn emit_object(module: ObjectModule) -> Result<Vec<u8>, CodegenError> {
    let product = module.finish();
    let bytes = product
        .emit()
        .map_err(|e| CodegenError::EmissionError(format!("failed to emit object file: {e}")))?;
    Ok(bytes)
}

/// Finish the module and write the object file to disk.
pub fn emit_to_file(module: ObjectModule, path: &Path) -> Result<(), CodegenError> {
    let bytes = emit_object(module)?;
    std::fs::write(path, &bytes)?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::CodegenContext;

    #[test]
    fn emit_empty_object() {
        let ctx = CodegenContext::new().unwrap();
        let bytes = emit_object(ctx.module).expect("emission should succeed");
        // ELF, Mach-O and COFF headers are all longer than this.
        assert!(bytes.len() > 16, "object file should have a header");
    }

    #[test]
    fn emit_object_to_file() {
        let dir = std::env::temp_dir().join("pyaot_test_emit");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.o");
        let _ = std::fs::remove_file(&path);
        emit_to_file(CodegenContext::new().unwrap().module, &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 16);
    }
}
