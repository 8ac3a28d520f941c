//! Error types for content tooling.
//!
//! Validation findings are not errors; they are collected as
//! [`Violation`](crate::validate::Violation)s. The variants here are the
//! fatal conditions that abort an invocation.

use std::path::PathBuf;

/// Fatal errors raised while walking, hashing or persisting content.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    /// An explicitly requested file does not exist
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// An explicitly requested file is not YAML or JSON content
    #[error("Not a structured content file: {}", .0.display())]
    Unsupported(PathBuf),

    /// The content root is missing or is not a directory
    #[error("Content root is not a directory: {}", .0.display())]
    RootNotFound(PathBuf),

    /// Directory traversal failed
    #[error("Failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Reading or writing a file failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The manifest exists but cannot be decoded
    #[error("Invalid manifest {}: {source}", path.display())]
    InvalidManifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The manifest could not be encoded
    #[error("Failed to encode manifest: {0}")]
    ManifestEncode(#[source] serde_json::Error),
}

impl ContentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Release version parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("Expected YYYY.MM.DD.PATCH, got `{0}`")]
    Format(String),

    #[error("Invalid calendar date in `{0}`")]
    Date(String),

    #[error("Invalid semantic version `{0}`")]
    SemVer(String),

    /// No patch number is left after the given release
    #[error("No patch number left after release `{0}`")]
    PatchExhausted(String),
}

pub type Result<T, E = ContentError> = std::result::Result<T, E>;
