//! Error types for the knowledge store.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for knowledge operations.
pub type KnowledgeResult<T> = Result<T, KnowledgeError>;

/// Errors raised while loading or querying knowledge documents.
#[derive(Error, Debug)]
pub enum KnowledgeError {
    #[error("Knowledge document not found: {document} ({path})")]
    NotFound { document: String, path: PathBuf },

    #[error("Malformed knowledge document {document}: {message}")]
    Malformed { document: String, message: String },

    #[error("Inconsistent knowledge document {document}: {message}")]
    Inconsistent { document: String, message: String },

    #[error("IO error reading {document}: {source}")]
    Io {
        document: String,
        #[source]
        source: std::io::Error,
    },
}

impl KnowledgeError {
    /// Name of the document the error refers to.
    pub fn document(&self) -> &str {
        match self {
            Self::NotFound { document, .. }
            | Self::Malformed { document, .. }
            | Self::Inconsistent { document, .. }
            | Self::Io { document, .. } => document,
        }
    }

    pub(crate) fn inconsistent(document: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inconsistent {
            document: document.into(),
            message: message.into(),
        }
    }
}
