//! One compilation from a `.py` file to a `.o` file.

use std::io::Write;
use std::path::{Path, PathBuf};

use pyaot_codegen::{CodegenContext, CodegenError, CodegenOptions, OptLevel};
use pyaot_compiler::{CompileError, TranslateError};
use serde::Serialize;
use thiserror::Error;

use crate::colors::bold;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("'{}' is not a .py file", .0.display())]
    NotPython(PathBuf),
    #[error("cannot read '{}': {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid opt level '{0}' (expected none, speed or speed_and_size)")]
    InvalidOptLevel(String),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Codegen(#[from] CodegenError),
    #[error("cannot serialize dump: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<TranslateError> for DriverError {
    fn from(err: TranslateError) -> Self {
        DriverError::Compile(err.into())
    }
}

/// Everything one build needs, after flags and config are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildRequest {
    pub input: PathBuf,
    pub output: PathBuf,
    pub show_syntax: bool,
    pub show_ir: bool,
    pub show_clif: bool,
    pub json: bool,
    pub target: Option<String>,
    pub opt_level: OptLevel,
}

impl BuildRequest {
    /// A request with the default output path and no dumps.
    pub fn new(input: impl Into<PathBuf>) -> Self {
        let input = input.into();
        let output = default_output(&input, None);
        Self { input, output, ..Self::default() }
    }
}

/// `dir/stem.o` when an output directory is configured, else the input path with `.o`.
pub fn default_output(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    match (output_dir, input.file_stem()) {
        (Some(dir), Some(stem)) => dir.join(stem).with_extension("o"),
        _ => input.with_extension("o"),
    }
}

pub fn parse_opt_level(s: &str) -> Result<OptLevel, DriverError> {
    s.parse().map_err(|_| DriverError::InvalidOptLevel(s.to_string()))
}

fn dump<T: Serialize + std::fmt::Debug>(
    out: &mut dyn Write,
    title: &str,
    value: &T,
    json: bool,
) -> Result<(), DriverError> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    } else {
        writeln!(out, "{}", bold(title))?;
        writeln!(out, "{value:#?}")?;
    }
    Ok(())
}

/// Compile `request.input` and write the object file. Dumps go to `out`.
///
/// Nothing is written to `request.output` unless every stage succeeds.
pub fn run(request: &BuildRequest, out: &mut dyn Write) -> Result<PathBuf, DriverError> {
    let input = &request.input;
    if input.extension().and_then(|e| e.to_str()) != Some("py") {
        return Err(DriverError::NotPython(input.clone()));
    }
    let source = std::fs::read_to_string(input)
        .map_err(|source| DriverError::Read { path: input.clone(), source })?;

    let tree = pyaot_compiler::parse(&source)?;
    if request.show_syntax {
        dump(out, "syntax tree:", &tree, request.json)?;
    }

    let module = pyaot_compiler::translate_module(&tree)?;
    if request.show_ir {
        dump(out, "ir:", &module, request.json)?;
    }

    let options = CodegenOptions {
        target: request.target.clone(),
        opt_level: request.opt_level,
        module_name: input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| CodegenOptions::default().module_name),
    };
    let backend = pyaot_codegen::lower(&module, CodegenContext::from_options(&options)?)?;
    if request.show_clif {
        if !request.json {
            writeln!(out, "{}", bold("clif:"))?;
        }
        writeln!(out, "{}", backend.clif_text())?;
    }

    backend.emit_to_file(&request.output)?;
    Ok(request.output.clone())
}
