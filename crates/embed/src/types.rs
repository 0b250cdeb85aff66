use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::EmbedError;

/// Embedding output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Embedding {
    /// Unit-length embedding values.
    pub vector: Vec<f32>,
    /// Name of the model used to produce the vector.
    pub model_name: String,
    /// Dimension of `vector`.
    pub embedding_dim: usize,
    /// Whether [`vector`](Self::vector) was L2-normalized by the provider.
    pub normalized: bool,
}

impl Embedding {
    pub(crate) fn new(vector: Vec<f32>, model_name: &str) -> Self {
        let embedding_dim = vector.len();
        Self {
            vector,
            model_name: model_name.to_string(),
            embedding_dim,
            normalized: true,
        }
    }

    /// Consume the embedding and keep only the raw vector.
    pub fn into_vector(self) -> Vec<f32> {
        self.vector
    }
}

/// Where an image to embed comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    /// Image file on the local filesystem.
    Path(PathBuf),
    /// Encoded image bytes already in memory (e.g. an upload).
    Bytes(Vec<u8>),
}

impl ImageSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        ImageSource::Path(path.into())
    }

    /// Read the encoded image bytes, touching the filesystem for `Path` sources.
    pub fn read_bytes(&self) -> Result<Vec<u8>, EmbedError> {
        match self {
            ImageSource::Path(path) => std::fs::read(path)
                .map_err(|err| EmbedError::unreadable(path.display().to_string(), err)),
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }

    /// Short label for logs.
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
        }
    }
}

impl From<&Path> for ImageSource {
    fn from(path: &Path) -> Self {
        ImageSource::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes)
    }
}
