//! Errors raised by the repositories.

use std::path::PathBuf;

use deck_model::CodecError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Nothing has been stored at `path` yet.
    #[error("no stored data at {path}")]
    NotFound { path: PathBuf },

    /// The file exists but cannot be turned back into a value.
    #[error("corrupt data in {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A page could not be encoded for persistence.
    #[error("cannot encode page type `{tag}`")]
    Codec { tag: String },
}

impl RepositoryError {
    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        RepositoryError::Corrupt {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RepositoryError::Io {
            path: path.into(),
            source,
        }
    }

    /// Maps an encoding failure; decoding failures are data corruption.
    pub(crate) fn encoding(error: CodecError) -> Self {
        let tag = match error {
            CodecError::UnknownTag { tag } => tag,
            CodecError::Unregistered { tag } | CodecError::Mismatch { tag } => tag.to_owned(),
            CodecError::Json { tag, .. } => tag,
        };
        RepositoryError::Codec { tag }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RepositoryError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
