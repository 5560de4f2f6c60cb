//! Error types for the grouper kernel

use std::path::PathBuf;
use thiserror::Error;

/// Result type for kernel operations
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors raised by the kernel collaborators (parser, loaders, groupers)
#[derive(Debug, Error)]
pub enum KernelError {
    /// Patient case string could not be parsed
    #[error("{0}")]
    Parse(String),

    /// Specification workspace is invalid
    #[error("Invalid specification in {path}: {message}")]
    Specification { path: PathBuf, message: String },

    /// Catalogue file is invalid
    #[error("Invalid catalogue {path}: {message}")]
    Catalogue { path: PathBuf, message: String },

    /// A required file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reading a file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON decoding failed
    #[error("Failed to decode {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// CSV decoding failed
    #[error("Failed to decode {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl KernelError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn specification(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Specification {
            path: path.into(),
            message: msg.into(),
        }
    }

    pub fn catalogue(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Catalogue {
            path: path.into(),
            message: msg.into(),
        }
    }

    /// Map an I/O error on `path`, turning `NotFound` into [`KernelError::FileNotFound`].
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path)
        } else {
            Self::Io { path, source }
        }
    }
}
