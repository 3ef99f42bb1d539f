//! yolol_vm_parser
//!
//! Lexer, parsers, AST, visitor engine and printer for YOLOL and NOLOL.
//!
//! # Example
//!
//! ```
//! use yolol_vm_parser::{parse_yolol, Printer};
//!
//! let program = parse_yolol("a = 1 + 2  b = a == 3").unwrap();
//! assert_eq!(program.lines.len(), 1);
//! assert_eq!(Printer::new().print(&program).unwrap(), "a=1+2 b=a==3\n");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod span;
pub mod token;
pub mod visitor;

// Re-exports
pub use error::{ParseError, ParseErrors, ParseResult};
pub use lexer::{Lexer, SpannedToken};
pub use parser::{
    parse_nolol, parse_nolol_file, parse_yolol, parse_yolol_with_errors, Dialect, Parser,
};
pub use printer::{PrintError, Printer};
pub use span::{SourceMap, Span};
pub use token::{Precedence, Token};
pub use visitor::{
    accept_list, accept_slot, walk, Accept, ChildNode, Node, NodeMut, Phase, Replacement, Visit,
    Visitor,
};

/// Tokenize source code
///
/// Returns a vector of tokens with their spans.
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken<'_>, ParseError>> {
    lexer::tokenize(source)
}

/// Get version information
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
