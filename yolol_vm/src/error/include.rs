use std::path::PathBuf;

/// Errors a [`FileSystem`](crate::include::FileSystem) reports while fetching an included file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IncludeError {
    /// No file with that name.
    FileNotFound {
        requested_path: String,
        resolved_path: PathBuf,
    },

    /// The file exists but could not be read.
    IoError { file_path: String, message: String },
}

impl std::fmt::Display for IncludeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FileNotFound {
                requested_path,
                resolved_path,
            } => {
                write!(
                    f,
                    "include: file not found '{}' (resolved to '{}')",
                    requested_path,
                    resolved_path.display()
                )
            }
            Self::IoError { file_path, message } => {
                write!(f, "include: I/O error reading '{}': {}", file_path, message)
            }
        }
    }
}

impl std::error::Error for IncludeError {}
