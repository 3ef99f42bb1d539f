//! File systems for `include "file"` directives.
//!
//! The converter never touches the disk directly. It asks a [`FileSystem`]
//! for the contents of each included file, so tests and editors can feed it
//! in-memory files while the command line uses [`DiskFileSystem`].
//!
//! # Example
//!
//! ```
//! use yolol_vm::include::{FileSystem, MemoryFileSystem};
//!
//! let mut fs = MemoryFileSystem::new();
//! fs.register("lib.nolol", "x = 1");
//! assert_eq!(fs.get("lib.nolol").unwrap(), "x = 1");
//! assert_eq!(fs.get("./lib.nolol").unwrap(), "x = 1");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::IncludeError;

/// Source of included files
pub trait FileSystem: Send + Sync {
    /// Contents of the file with the given name
    fn get(&self, name: &str) -> Result<String, IncludeError>;
}

impl<T: FileSystem + ?Sized> FileSystem for &T {
    fn get(&self, name: &str) -> Result<String, IncludeError> {
        (**self).get(name)
    }
}

/// Reads included files relative to a base directory
#[derive(Debug, Clone)]
pub struct DiskFileSystem {
    base_dir: PathBuf,
}

impl DiskFileSystem {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Resolve relative to the directory containing `file`
    pub fn next_to(file: &Path) -> Self {
        Self::new(file.parent().map(Path::to_path_buf).unwrap_or_default())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl FileSystem for DiskFileSystem {
    fn get(&self, name: &str) -> Result<String, IncludeError> {
        let path = resolve_include_path(name, Some(&self.base_dir));
        read_include_file(name, &path)
    }
}

/// In-memory files, keyed by name
#[derive(Default, Clone)]
pub struct MemoryFileSystem {
    files: HashMap<String, String>,
}

impl MemoryFileSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, path: &str, source: &str) {
        self.files.insert(normalize(path).to_string(), source.to_string());
    }

    pub fn with_file(mut self, path: &str, source: &str) -> Self {
        self.register(path, source);
        self
    }
}

impl fmt::Debug for MemoryFileSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&String> = self.files.keys().collect();
        names.sort();
        f.debug_struct("MemoryFileSystem").field("files", &names).finish()
    }
}

impl FileSystem for MemoryFileSystem {
    fn get(&self, name: &str) -> Result<String, IncludeError> {
        self.files
            .get(normalize(name))
            .cloned()
            .ok_or_else(|| IncludeError::FileNotFound {
                requested_path: name.to_string(),
                resolved_path: PathBuf::from(normalize(name)),
            })
    }
}

fn normalize(path: &str) -> &str {
    path.trim_start_matches("./").trim_start_matches('/')
}

/// Name of the file an include directive refers to: names without an
/// extension get `extension` appended.
pub fn include_file_name(name: &str, extension: &str) -> String {
    if Path::new(name).extension().is_some() || extension.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", name, extension)
    }
}

/// Resolve an include path relative to a base directory.
/// Absolute paths are returned as-is.
pub fn resolve_include_path(path: &str, base_dir: Option<&Path>) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        match base_dir {
            Some(base) => base.join(p),
            None => p.to_path_buf(),
        }
    }
}

fn read_include_file(name: &str, path: &Path) -> Result<String, IncludeError> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IncludeError::FileNotFound {
                requested_path: name.to_string(),
                resolved_path: path.to_path_buf(),
            }
        } else {
            IncludeError::IoError {
                file_path: path.to_string_lossy().to_string(),
                message: e.to_string(),
            }
        }
    })
}
