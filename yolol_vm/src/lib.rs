//! yolol_vm
//!
//! NOLOL to YOLOL conversion, YOLOL optimizers and a YOLOL virtual machine
//! that can run several programs in lock-step.
//!
//! # Example
//!
//! ```
//! use yolol_vm::pipeline::compile_str;
//!
//! let yolol = compile_str("total = 0\nwhile total < 5 do\n total++\nend\n:done = 1").unwrap();
//! assert!(yolol.lines().count() <= 20);
//! ```

// Prevent accidental debug output in library code
#![deny(clippy::print_stderr)]

pub mod config;
pub mod converter;
pub mod error;
pub mod include;
pub mod number;
pub mod optimizers;
pub mod value;
pub mod vm;

// Parse + convert + load in one call
pub mod pipeline;

pub use config::ConvertOptions;
pub use converter::{Conversion, Converter};
pub use error::{ConvertError, ConvertErrors, IncludeError, RuntimeError};
pub use number::Number;
pub use value::Value;
pub use vm::{Coordinator, Vm, VmError, VmState};
