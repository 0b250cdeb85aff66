use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;
use crate::{EmbedConfig, EmbedError, Embedding, EmbeddingProvider, ImageSource};

/// Deterministic provider for tests and offline runs.
///
/// Generates sinusoid values derived from a hash of the input so the same text
/// or the same image bytes always produce the same unit vector.
#[derive(Debug, Clone)]
pub struct StubEmbedder {
    model_name: String,
    dimension: usize,
}

impl StubEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            model_name: "stub".into(),
            dimension,
        }
    }

    pub fn from_config(cfg: &EmbedConfig) -> Result<Self, EmbedError> {
        if cfg.dimension == 0 {
            return Err(EmbedError::InvalidConfig(
                "dimension must be greater than zero".into(),
            ));
        }
        Ok(Self {
            model_name: cfg.model_name.clone(),
            dimension: cfg.dimension,
        })
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed_bytes(&self, domain: u8, bytes: &[u8]) -> Result<Embedding, EmbedError> {
        // Text and image inputs hash into separate domains so a caption and a
        // file with identical bytes do not collide.
        let mut seed = Vec::with_capacity(bytes.len() + 1);
        seed.push(domain);
        seed.extend_from_slice(bytes);
        let h = hash64(&seed);

        let mut v = vec![0f32; self.dimension];
        for (idx, value) in v.iter_mut().enumerate() {
            *value = ((h >> (idx % 32)) as f32 * 0.0001 + idx as f32).sin();
        }
        l2_normalize_in_place(&mut v)?;
        Ok(Embedding::new(v, &self.model_name))
    }
}

impl EmbeddingProvider for StubEmbedder {
    fn embed_text(&self, text: &str) -> Result<Embedding, EmbedError> {
        self.embed_bytes(b't', text.as_bytes())
    }

    fn embed_image(&self, image: &ImageSource) -> Result<Embedding, EmbedError> {
        let bytes = image.read_bytes()?;
        self.embed_bytes(b'i', &bytes)
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn stub_text_has_configured_dimension_and_unit_norm() {
        let embedder = StubEmbedder::new(64);
        let embedding = embedder.embed_text("casual summer outfit").unwrap();

        assert_eq!(embedding.embedding_dim, 64);
        assert_eq!(embedding.vector.len(), 64);
        assert!(embedding.normalized);
        assert!((norm(&embedding.vector) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn stub_is_deterministic() {
        let embedder = StubEmbedder::new(32);
        let a = embedder.embed_text("same prompt").unwrap();
        let b = embedder.embed_text("same prompt").unwrap();
        assert_eq!(a.vector, b.vector);
    }

    #[test]
    fn stub_different_text_differs() {
        let embedder = StubEmbedder::new(32);
        let a = embedder.embed_text("denim jacket").unwrap();
        let b = embedder.embed_text("linen trousers").unwrap();
        assert_ne!(a.vector, b.vector);
    }

    #[test]
    fn stub_image_hashes_file_bytes() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"jpeg-bytes").unwrap();

        let embedder = StubEmbedder::new(16);
        let from_path = embedder
            .embed_image(&ImageSource::from(file.path()))
            .unwrap();
        let from_bytes = embedder
            .embed_image(&ImageSource::Bytes(b"jpeg-bytes".to_vec()))
            .unwrap();
        assert_eq!(from_path.vector, from_bytes.vector);

        let as_text = embedder.embed_text("jpeg-bytes").unwrap();
        assert_ne!(from_bytes.vector, as_text.vector);
    }

    #[test]
    fn stub_missing_image_fails() {
        let embedder = StubEmbedder::new(16);
        let err = embedder
            .embed_image(&ImageSource::path("/nope/missing.png"))
            .unwrap_err();
        assert!(matches!(err, EmbedError::Unreadable { .. }));
    }

    #[test]
    fn stub_from_config_uses_model_name() {
        let cfg = EmbedConfig::stub(8).with_model_name("tiny-clip");
        let embedder = StubEmbedder::from_config(&cfg).unwrap();
        assert_eq!(embedder.model_name(), "tiny-clip");
        assert_eq!(embedder.dimension(), 8);
        assert_eq!(embedder.embed_text("x").unwrap().model_name, "tiny-clip");
    }

    #[test]
    fn stub_empty_text_still_produces_vector() {
        let embedder = StubEmbedder::new(16);
        let embedding = embedder.embed_text("").unwrap();
        assert!((norm(&embedding.vector) - 1.0).abs() < 1e-4);
    }
}
