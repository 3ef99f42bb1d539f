//! Parse, convert and load in one call.
//!
//! NOLOL source → parser → converter → YOLOL program → VM

use std::path::Path;

use crate::config::ConvertOptions;
use crate::converter::{Conversion, Converter};
use crate::error::{ConvertError, ConvertErrors};
use crate::include::{DiskFileSystem, FileSystem, MemoryFileSystem};
use crate::vm::Vm;

/// Error variants produced by the pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The main source file could not be read.
    Io { path: String, message: String },
    /// Parsing or converting failed; every error of the failing pass.
    Convert(ConvertErrors),
}

impl std::fmt::Display for PipelineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineError::Io { path, message } => write!(f, "cannot read {}: {}", path, message),
            PipelineError::Convert(errors) => write!(f, "conversion failed:\n{}", errors),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<ConvertErrors> for PipelineError {
    fn from(errors: ConvertErrors) -> Self {
        PipelineError::Convert(errors)
    }
}

impl From<ConvertError> for PipelineError {
    fn from(error: ConvertError) -> Self {
        PipelineError::Convert(error.into())
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;

/// Convert NOLOL source, resolving includes through `fs`
pub fn convert_source(
    source: &str,
    fs: &dyn FileSystem,
    options: ConvertOptions,
) -> PipelineResult<Conversion> {
    Ok(Converter::new(fs)
        .with_options(options)
        .convert_source(source, None)?)
}

/// Convert a NOLOL file; includes are looked up next to it
pub fn convert_file(path: &Path, options: ConvertOptions) -> PipelineResult<Conversion> {
    let source = std::fs::read_to_string(path).map_err(|e| PipelineError::Io {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let fs = DiskFileSystem::next_to(path);
    let file = path.display().to_string();
    Ok(Converter::new(&fs)
        .with_options(options)
        .convert_source(&source, Some(&file))?)
}

/// YOLOL source text for a self-contained NOLOL program, default options
pub fn compile_str(source: &str) -> PipelineResult<String> {
    let conversion = convert_source(source, &MemoryFileSystem::new(), ConvertOptions::default())?;
    Ok(conversion.source()?)
}

/// Convert NOLOL source and load the result into a paused VM. The
/// conversion is returned as well, for its variable translations.
pub fn load_source(
    source: &str,
    fs: &dyn FileSystem,
    options: ConvertOptions,
) -> PipelineResult<(Vm, Conversion)> {
    let conversion = convert_source(source, fs, options)?;
    let vm = Vm::new(conversion.program.clone());
    Ok((vm, conversion))
}
