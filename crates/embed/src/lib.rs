//! Outfit Embeddings
//!
//! This crate turns garment photos and free-text style prompts into unit-length
//! vectors that live in one shared space, so a prompt like "casual summer" can be
//! compared directly against a picture of a linen shirt.
//!
//! Two providers ship here:
//!
//! - **Stub mode** - Deterministic hashed vectors. Offline, fast, good for tests.
//! - **API mode** - POSTs JSON to a remote CLIP-style endpoint (Hugging Face,
//!   OpenAI-compatible, or a custom server). Images travel base64-encoded.
//!
//! Both hand back an [`Embedding`] whose vector is already L2-normalized, which
//! keeps cosine similarity downstream a plain dot product.
//!
//! ## Quick example
//!
//! ```
//! use embed::{build_provider, EmbedConfig};
//!
//! let provider = build_provider(&EmbedConfig::stub(32)).unwrap();
//! let prompt = provider.embed_text("smart casual for a dinner").unwrap();
//! assert_eq!(prompt.embedding_dim, 32);
//! ```
//!
//! ## API mode
//!
//! ```no_run
//! use embed::{build_provider, EmbedConfig, ImageSource};
//!
//! let cfg = EmbedConfig {
//!     mode: "api".into(),
//!     api_url: Some("http://localhost:8000/embed".into()),
//!     api_auth_header: Some("Bearer YOUR_TOKEN".into()),
//!     ..Default::default()
//! };
//! let provider = build_provider(&cfg).unwrap();
//! let shirt = provider.embed_image(&ImageSource::path("wardrobe/shirt.jpg")).unwrap();
//! ```
//!
//! Transient HTTP failures (timeouts, 429, 5xx) are retried inside the client
//! according to [`RetryConfig`]. Callers only ever see the final outcome.

pub mod config;
pub mod error;
pub mod retry;
pub mod types;

mod api;
mod normalize;
mod serde_millis;
mod stub;

pub use crate::api::ApiEmbedder;
pub use crate::config::EmbedConfig;
pub use crate::error::EmbedError;
pub use crate::retry::RetryConfig;
pub use crate::stub::StubEmbedder;
pub use crate::types::{Embedding, ImageSource};

/// Maps images and text into the same vector space.
///
/// Implementations must be thread-safe; one provider is shared by every
/// request an assistant serves.
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a style prompt or garment description.
    fn embed_text(&self, text: &str) -> Result<Embedding, EmbedError>;

    /// Embed an encoded image (JPEG, PNG, ...).
    fn embed_image(&self, image: &ImageSource) -> Result<Embedding, EmbedError>;

    /// Label attached to every embedding this provider produces.
    fn model_name(&self) -> &str;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn embed_text(&self, text: &str) -> Result<Embedding, EmbedError> {
        (**self).embed_text(text)
    }

    fn embed_image(&self, image: &ImageSource) -> Result<Embedding, EmbedError> {
        (**self).embed_image(image)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}

/// Build the provider selected by `cfg.mode`.
pub fn build_provider(cfg: &EmbedConfig) -> Result<Box<dyn EmbeddingProvider>, EmbedError> {
    cfg.validate()?;
    let provider: Box<dyn EmbeddingProvider> = match cfg.mode.as_str() {
        "api" => Box::new(ApiEmbedder::from_config(cfg)?),
        _ => Box::new(StubEmbedder::from_config(cfg)?),
    };
    tracing::debug!(mode = %cfg.mode, model = %cfg.model_name, "embed_provider_ready");
    Ok(provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_provider_stub_mode() {
        let provider = build_provider(&EmbedConfig::stub(24)).unwrap();
        let embedding = provider.embed_text("weekend brunch").unwrap();
        assert_eq!(embedding.embedding_dim, 24);
        assert_eq!(provider.model_name(), "clip-vit-base-patch32");
    }

    #[test]
    fn build_provider_api_mode_without_network_call() {
        let cfg = EmbedConfig {
            mode: "api".into(),
            api_url: Some("http://localhost:1/embed".into()),
            ..Default::default()
        };
        assert!(build_provider(&cfg).is_ok());
    }

    #[test]
    fn build_provider_rejects_invalid_config() {
        let cfg = EmbedConfig {
            mode: "onnx".into(),
            ..Default::default()
        };
        assert!(matches!(
            build_provider(&cfg),
            Err(EmbedError::InvalidConfig(_))
        ));
    }

    #[test]
    fn boxed_provider_delegates() {
        let boxed: Box<StubEmbedder> = Box::new(StubEmbedder::new(8));
        let direct = StubEmbedder::new(8).embed_text("coat").unwrap();
        assert_eq!(boxed.embed_text("coat").unwrap().vector, direct.vector);
    }
}
