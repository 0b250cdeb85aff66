use serde::{Deserialize, Serialize};

use crate::retry::RetryConfig;
use crate::EmbedError;

/// Runtime configuration describing which provider to build and how to reach it.
///
/// # Example
/// ```
/// use embed::EmbedConfig;
///
/// let cfg = EmbedConfig {
///     mode: "api".into(),
///     api_url: Some("https://embed.example.com/v1/clip".into()),
///     api_auth_header: Some("Bearer sk_xxx".into()),
///     api_provider: Some("custom".into()),
///     ..Default::default()
/// };
/// assert!(cfg.validate().is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbedConfig {
    /// Provider selector: `"stub"` (deterministic, offline) or `"api"` (remote HTTP).
    pub mode: String,
    /// Friendly label surfaced on every [`Embedding`](crate::Embedding).
    pub model_name: String,
    /// Vector dimension produced by the stub provider. Remote providers report
    /// whatever the model emits.
    pub dimension: usize,
    /// API inference endpoint when [`mode`](Self::mode) is `"api"`.
    pub api_url: Option<String>,
    /// Authorization header (e.g., `"Bearer hf_xxx"`).
    pub api_auth_header: Option<String>,
    /// Remote provider hint: `"hf"`, `"openai"`, or `"custom"` (default).
    pub api_provider: Option<String>,
    /// Overall API timeout in seconds.
    pub api_timeout_secs: Option<u64>,
    /// Client-side retry policy for transient HTTP failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_config: Option<RetryConfig>,
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            mode: "stub".into(),
            model_name: "clip-vit-base-patch32".into(),
            dimension: 512,
            api_url: None,
            api_auth_header: None,
            api_provider: None,
            api_timeout_secs: Some(30),
            retry_config: None,
        }
    }
}

impl EmbedConfig {
    /// Convenience constructor for the offline stub provider.
    pub fn stub(dimension: usize) -> Self {
        Self {
            mode: "stub".into(),
            dimension,
            ..Self::default()
        }
    }

    pub fn with_model_name(mut self, name: impl Into<String>) -> Self {
        self.model_name = name.into();
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = Some(url.into());
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry_config = Some(retry);
        self
    }

    /// Check the invariants each provider relies on.
    pub fn validate(&self) -> Result<(), EmbedError> {
        match self.mode.as_str() {
            "stub" => {
                if self.dimension == 0 {
                    return Err(EmbedError::InvalidConfig(
                        "dimension must be greater than zero".into(),
                    ));
                }
            }
            "api" => {
                let url = self.api_url.as_deref().map(str::trim).unwrap_or_default();
                if url.is_empty() {
                    return Err(EmbedError::InvalidConfig(
                        "api_url is required for api mode".into(),
                    ));
                }
                if self.api_timeout_secs == Some(0) {
                    return Err(EmbedError::InvalidConfig(
                        "api_timeout_secs must be greater than zero".into(),
                    ));
                }
            }
            other => {
                return Err(EmbedError::InvalidConfig(format!(
                    "unknown embed mode '{other}', expected 'stub' or 'api'"
                )))
            }
        }
        if self.model_name.trim().is_empty() {
            return Err(EmbedError::InvalidConfig(
                "model_name must not be empty".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_stub() {
        let cfg = EmbedConfig::default();
        assert_eq!(cfg.mode, "stub");
        assert_eq!(cfg.dimension, 512);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn api_mode_requires_url() {
        let cfg = EmbedConfig {
            mode: "api".into(),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("api_url"));

        let cfg = cfg.with_api_url("http://localhost:8080/embed");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn zero_dimension_rejected_for_stub() {
        let err = EmbedConfig::stub(0).validate().unwrap_err();
        assert!(err.to_string().contains("dimension"));
    }

    #[test]
    fn unknown_mode_rejected() {
        let cfg = EmbedConfig {
            mode: "onnx".into(),
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().to_string().contains("onnx"));
    }

    #[test]
    fn config_serde_roundtrip() {
        let cfg = EmbedConfig::stub(8).with_model_name("tiny");
        let json = serde_json::to_string(&cfg).unwrap();
        let back: EmbedConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, back);
    }
}
