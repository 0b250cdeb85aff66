use std::io;
use thiserror::Error;

/// Errors surfaced by embedding providers.
#[derive(Debug, Error)]
pub enum EmbedError {
    /// Configuration is inconsistent (e.g., api mode without an endpoint).
    #[error("invalid embed config: {0}")]
    InvalidConfig(String),
    /// The image could not be read from disk.
    #[error("unreadable image {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: io::Error,
    },
    /// The remote embedding endpoint could not be reached or rejected the call.
    #[error("request failed: {0}")]
    Request(String),
    /// The provider answered but produced no usable vector.
    #[error("inference failure: {0}")]
    Inference(String),
}

impl EmbedError {
    pub(crate) fn unreadable(path: impl Into<String>, source: io::Error) -> Self {
        EmbedError::Unreadable {
            path: path.into(),
            source,
        }
    }
}
