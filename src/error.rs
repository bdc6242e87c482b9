// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Kiro

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Kiro operations
pub type Result<T> = std::result::Result<T, KiroError>;

/// Kiro error types
#[derive(Error, Debug)]
pub enum KiroError {
    #[error("Source file unavailable: {0:?}")]
    SourceUnavailable(PathBuf),

    #[error("Not a regular file: {0:?}")]
    NotAFile(PathBuf),

    #[error("Cannot create directory {path:?}: {source}")]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to move {from:?} to {to:?}: {reason}")]
    MoveFailed {
        from: PathBuf,
        to: PathBuf,
        reason: String,
    },

    #[error("Modification time out of range: {0:?}")]
    InvalidTimestamp(PathBuf),

    #[error("File did not settle before timeout: {0:?}")]
    FileNotStable(PathBuf),

    #[error("Path resolution error: {0}")]
    PathResolution(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl KiroError {
    /// Build a `MoveFailed` from an I/O error
    pub fn move_failed(from: &std::path::Path, to: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::MoveFailed {
            from: from.to_path_buf(),
            to: to.to_path_buf(),
            reason: err.to_string(),
        }
    }
}
