use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the navigator and the node-level operations built on it.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("node #{node} has not been initialized: missing {what}")]
    Uninitialized { node: u32, what: &'static str },

    #[error("image already loaded: {dir}{filename}")]
    AlreadyLoaded { dir: String, filename: String },

    #[error("no image in {dir:?}")]
    EmptySelection { dir: String },

    #[error("field {field:?} can not be changed")]
    ProtectedField { field: &'static str },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures reported by a [`LayerStore`](crate::LayerStore) implementation.
///
/// Every variant means "the request did not apply"; callers keep their
/// previous state.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid path: {0:?}")]
    InvalidPath(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error: {0}")]
    Image(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    /// Wrap an `io::Error` together with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
