//! Converter configuration
//!
//! Options come from code, from a TOML table or from the environment:
//!
//! ```toml
//! max_line_length = 70
//! max_lines = 20
//! shorten_variable_names = true
//! fold_constants = true
//! include_extension = "nolol"
//! ```

use std::env;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Characters per YOLOL line
pub const MAX_LINE_LENGTH: usize = 70;
/// Lines per YOLOL chip
pub const MAX_LINES: usize = 20;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("invalid converter configuration: {message}")]
    InvalidToml { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConvertOptions {
    pub max_line_length: usize,
    pub max_lines: usize,
    /// Rename local variables to the shortest free names
    pub shorten_variable_names: bool,
    /// Evaluate constant sub-expressions at compile time
    pub fold_constants: bool,
    /// Appended to included file names that have no extension
    pub include_extension: String,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        Self {
            max_line_length: MAX_LINE_LENGTH,
            max_lines: MAX_LINES,
            shorten_variable_names: true,
            fold_constants: true,
            include_extension: "nolol".to_string(),
        }
    }
}

impl ConvertOptions {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        toml::from_str(source).map_err(|e| ConfigError::InvalidToml {
            message: e.to_string(),
        })
    }

    /// Defaults, overridden by `NOLOL_MAX_LINE_LENGTH`, `NOLOL_NO_SHORTEN`
    /// and `NOLOL_NO_FOLD`
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(length) = var("NOLOL_MAX_LINE_LENGTH").and_then(|v| v.trim().parse().ok()) {
            options.max_line_length = length;
        }
        if var("NOLOL_NO_SHORTEN").is_some_and(|v| flag_set(&v)) {
            options.shorten_variable_names = false;
        }
        if var("NOLOL_NO_FOLD").is_some_and(|v| flag_set(&v)) {
            options.fold_constants = false;
        }
        options
    }

    pub fn with_shorten_variable_names(mut self, shorten: bool) -> Self {
        self.shorten_variable_names = shorten;
        self
    }

    pub fn with_fold_constants(mut self, fold: bool) -> Self {
        self.fold_constants = fold;
        self
    }

    pub fn with_max_line_length(mut self, length: usize) -> Self {
        self.max_line_length = length;
        self
    }
}

fn flag_set(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && value != "0" && !value.eq_ignore_ascii_case("false")
}
