//! Compilation context: ISA detection, module creation, and settings.

use std::sync::Arc;

use cranelift_codegen::isa::{self, TargetIsa};
use cranelift_codegen::settings::{self, Configurable};
use cranelift_object::{ObjectBuilder, ObjectModule};
use strum::{Display, EnumString};
use target_lexicon::Triple;

use crate::emit::CodegenError;

/// Cranelift optimisation level, spelled as in Cranelift's `opt_level` setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum OptLevel {
    None,
    #[default]
    Speed,
    SpeedAndSize,
}

#[derive(Debug, Clone)]
pub struct CodegenOptions {
    /// Target triple; `None` means the host.
    pub target: Option<String>,
    pub opt_level: OptLevel,
    /// Name recorded in the object file.
    pub module_name: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self { target: None, opt_level: OptLevel::default(), module_name: "pyaot_module".into() }
    }
}

/// Holds the Cranelift compilation state for a single codegen session.
pub struct CodegenContext {
    /// The target ISA (instruction set architecture).
    pub isa: Arc<dyn TargetIsa>,
    /// The object module being built.
    pub module: ObjectModule,
}

impl CodegenContext {
    /// Create a new codegen context targeting the host platform.
    pub fn new() -> Result<Self, CodegenError> {
        Self::from_options(&CodegenOptions::default())
    }

    /// Create a new codegen context for cross-compilation to the given target triple string.
    pub fn new_with_target(triple_str: &str) -> Result<Self, CodegenError> {
        Self::from_options(&CodegenOptions {
            target: Some(triple_str.to_string()),
            ..CodegenOptions::default()
        })
    }

    pub fn from_options(options: &CodegenOptions) -> Result<Self, CodegenError> {
        let mut flag_builder = settings::builder();
        flag_builder
            .set("opt_level", &options.opt_level.to_string())
            .map_err(|e| CodegenError::TargetError(format!("failed to set opt_level: {e}")))?;
        flag_builder
            .set("is_pic", "true")
            .map_err(|e| CodegenError::TargetError(format!("failed to set is_pic: {e}")))?;

        let isa_builder = match &options.target {
            Some(triple_str) => {
                let triple: Triple = triple_str.parse().map_err(|e| {
                    CodegenError::TargetError(format!("invalid target triple: {e}"))
                })?;
                isa::lookup(triple.clone()).map_err(|e| {
                    CodegenError::TargetError(format!("unsupported target {triple}: {e}"))
                })?
            }
            None => cranelift_native::builder().map_err(|e| {
                CodegenError::TargetError(format!("host target is not supported: {e}"))
            })?,
        };

        let flags = settings::Flags::new(flag_builder);
        let isa = isa_builder
            .finish(flags)
            .map_err(|e| CodegenError::TargetError(format!("failed to build ISA: {e}")))?;
        log::debug!("codegen target {} at opt level {}", isa.triple(), options.opt_level);

        let obj_builder = ObjectBuilder::new(
            isa.clone(),
            options.module_name.as_str(),
            cranelift_module::default_libcall_names(),
        )
        .map_err(|e| CodegenError::TargetError(format!("failed to create ObjectBuilder: {e}")))?;

        let module = ObjectModule::new(obj_builder);

        Ok(Self { isa, module })
    }

    /// Return the pointer type for the current target (e.g. I64 on 64-bit).
    pub fn pointer_type(&self) -> cranelift_codegen::ir::Type {
        self.isa.pointer_type()
    }
}
