//! Error types for annotation file operations.

use thiserror::Error;

/// Errors that can occur while reading or writing annotation documents.
#[derive(Error, Debug)]
pub enum FormatError {
    /// I/O error during file operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Document does not match the annotation schema or references
    /// vessels that do not exist
    #[error("Malformed annotation: {message}")]
    MalformedAnnotation {
        /// Description of what is wrong with the document
        message: String,
    },
}

impl FormatError {
    /// Create a malformed annotation error with a message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedAnnotation {
            message: message.into(),
        }
    }
}
