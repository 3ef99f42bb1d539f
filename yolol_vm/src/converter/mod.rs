//! NOLOL to YOLOL conversion
//!
//! The conversion is a fixed sequence of whole-tree passes. Each pass takes
//! the output type of the one before it, so they cannot run out of order:
//!
//! 1. [`includes`]: replace `include "file"` with the parsed file
//! 2. [`expansion`]: substitute definitions and insert macros
//! 3. [`lowering`]: builtin calls, `time()`, multi-line if, while, wait,
//!    break and continue become flat statements, labels and gotos
//! 4. [`lines`]: goto chains, unused labels, redundant gotos, merging of
//!    statement lines into physical lines, label resolution
//! 5. [`finalize`]: time counter, size checks
//!
//! A pass that finds errors reports all of them and the conversion stops
//! there.
//!
//! # Example
//!
//! ```
//! use yolol_vm::converter::Converter;
//! use yolol_vm::include::MemoryFileSystem;
//!
//! let fs = MemoryFileSystem::new();
//! let conversion = Converter::new(&fs)
//!     .convert_source("counter = 1\nwhile counter < 10 do\n counter++\nend", None)
//!     .unwrap();
//! assert!(conversion.program.lines.len() <= 20);
//! ```

mod expansion;
mod finalize;
mod includes;
mod lines;
mod lowering;

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;
use yolol_vm_parser::ast::{nolol, yolol, Stmt};
use yolol_vm_parser::{parse_nolol_file, Printer, Span};

use crate::config::ConvertOptions;
use crate::error::{ConvertError, ConvertErrors};
use crate::include::FileSystem;

/// Variable that counts executed lines when a program calls `time()`
pub const TIME_VARIABLE: &str = "_nolol_time";

/// Limit for nested includes and macro insertions
pub(crate) const MAX_NESTING: usize = 20;

/// Name shown for the main input in error messages
const MAIN_FILE: &str = "<input>";

/// Result of a successful conversion
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub program: yolol::Program,
    /// Original variable name to the name used in `program`
    pub variable_translations: BTreeMap<String, String>,
}

impl Conversion {
    /// YOLOL source text of the converted program
    pub fn source(&self) -> Result<String, ConvertError> {
        Ok(Printer::new().print(&self.program)?)
    }

    /// The name `variable` has in the converted program
    pub fn translate<'a>(&'a self, variable: &'a str) -> &'a str {
        self.variable_translations
            .get(variable)
            .map(String::as_str)
            .unwrap_or(variable)
    }
}

/// Converts NOLOL programs, fetching includes from a file system
pub struct Converter<'a> {
    fs: &'a dyn FileSystem,
    options: ConvertOptions,
}

impl fmt::Debug for Converter<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> Converter<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self {
            fs,
            options: ConvertOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ConvertOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    /// Parse and convert NOLOL source code
    pub fn convert_source(
        &self,
        source: &str,
        file: Option<&str>,
    ) -> Result<Conversion, ConvertErrors> {
        let program = parse_nolol_file(source, file).map_err(|errors| ConvertError::Parse {
            file: file.unwrap_or(MAIN_FILE).to_string(),
            errors,
        })?;
        self.convert(program)
    }

    /// Convert a parsed NOLOL program
    pub fn convert(&self, program: nolol::Program) -> Result<Conversion, ConvertErrors> {
        let mut ctx = Context::new(&self.options, self.fs);
        debug!(elements = program.elements.len(), "conversion started");
        let included = includes::resolve(&mut ctx, Parsed(program))?;
        let expanded = expansion::expand(&mut ctx, included)?;
        let lowered = lowering::lower(&mut ctx, expanded)?;
        let numbered = lines::number(&mut ctx, lowered)?;
        let conversion = finalize::finish(ctx, numbered)?;
        debug!(lines = conversion.program.lines.len(), "conversion finished");
        Ok(conversion)
    }
}

/// Convert a parsed NOLOL program with default options
pub fn convert(program: nolol::Program, fs: &dyn FileSystem) -> Result<Conversion, ConvertErrors> {
    Converter::new(fs).convert(program)
}

// ==================== Pass outputs ====================

/// Input of the include pass
pub(crate) struct Parsed(pub nolol::Program);

/// No include directives left
pub(crate) struct Included(pub nolol::Program);

/// No definitions, macros or insertions left
pub(crate) struct Expanded(pub nolol::Program);

/// Only statement lines left
pub(crate) struct Lowered(pub Vec<nolol::StatementLine>);

/// Physical lines with every label resolved to a line number
pub(crate) struct Numbered(pub yolol::Program);

/// State shared by the passes of one conversion
pub(crate) struct Context<'a> {
    pub options: &'a ConvertOptions,
    pub fs: &'a dyn FileSystem,
    /// Set when the program calls `time()`
    pub uses_time: bool,
    pub translations: BTreeMap<String, String>,
    next_id: usize,
}

impl<'a> Context<'a> {
    fn new(options: &'a ConvertOptions, fs: &'a dyn FileSystem) -> Self {
        Self {
            options,
            fs,
            uses_time: false,
            translations: BTreeMap::new(),
            next_id: 0,
        }
    }

    /// Fresh number for generated labels
    pub fn next_id(&mut self) -> usize {
        self.next_id += 1;
        self.next_id
    }

    /// Name of the time counter after variable renaming
    pub fn time_variable(&self) -> &str {
        self.translations
            .get(TIME_VARIABLE)
            .map(String::as_str)
            .unwrap_or(TIME_VARIABLE)
    }

    /// The time counter increment put in front of every line
    pub fn time_increment(&self, span: Span) -> Stmt {
        Stmt::Deref(yolol_vm_parser::ast::Dereference {
            variable: self.time_variable().to_string(),
            op: Some(yolol_vm_parser::ast::DerefOp::PostIncrement),
            span,
        })
    }

    /// Characters available to the statements of one line
    pub fn line_budget(&self) -> usize {
        let reserved = if self.uses_time {
            // `name++ `
            self.time_variable().len() + 3
        } else {
            0
        };
        self.options.max_line_length.saturating_sub(reserved)
    }
}
