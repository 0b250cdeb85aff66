use std::time::Duration;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::blocking::Client;
use serde_json::{json, Value};

use crate::normalize::l2_normalize_in_place;
use crate::retry::{execute_with_retry, is_retryable_status, RetryConfig};
use crate::{EmbedConfig, EmbedError, Embedding, EmbeddingProvider, ImageSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ApiProviderKind {
    HuggingFace,
    OpenAI,
    Custom,
}

/// What is being sent to the remote model.
enum ApiInput<'a> {
    Text(&'a str),
    Image(String),
}

/// One failed HTTP attempt, tagged with whether it is worth repeating.
#[derive(Debug)]
struct AttemptError {
    message: String,
    retryable: bool,
}

/// Remote embedding provider speaking JSON over HTTP.
///
/// Images are shipped base64-encoded. Text and image vectors come back in the
/// same space as long as the endpoint serves a CLIP-style joint model.
#[derive(Debug, Clone)]
pub struct ApiEmbedder {
    client: Client,
    url: String,
    auth_header: Option<String>,
    provider: ApiProviderKind,
    model_name: String,
    retry: RetryConfig,
}

impl ApiEmbedder {
    pub fn from_config(cfg: &EmbedConfig) -> Result<Self, EmbedError> {
        let url = cfg
            .api_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| EmbedError::InvalidConfig("api_url is required for api mode".into()))?;

        let timeout = Duration::from_secs(cfg.api_timeout_secs.unwrap_or(30));
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(10))
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|e| EmbedError::InvalidConfig(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.to_string(),
            auth_header: cfg.api_auth_header.clone(),
            provider: api_provider_kind(cfg.api_provider.as_deref()),
            model_name: cfg.model_name.clone(),
            retry: cfg.retry_config.unwrap_or_default(),
        })
    }

    fn embed(&self, input: ApiInput<'_>) -> Result<Embedding, EmbedError> {
        let payload = build_api_payload(self.provider, &input, &self.model_name);

        let outcome = execute_with_retry(
            &self.retry,
            |_| self.send(&payload),
            |err: &AttemptError| err.retryable,
        );
        let attempts = outcome.attempts;
        let response = outcome.into_result().map_err(|err| {
            tracing::warn!(attempts, error = %err.message, "embed_request_failed");
            EmbedError::Request(err.message)
        })?;

        let mut vector = first_embedding(response)?;
        l2_normalize_in_place(&mut vector)?;
        Ok(Embedding::new(vector, &self.model_name))
    }

    fn send(&self, payload: &Value) -> Result<Value, AttemptError> {
        let mut request = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json");
        if let Some(header) = self.auth_header.as_deref() {
            request = request.header("Authorization", header);
        }

        let response = request.json(payload).send().map_err(|e| AttemptError {
            retryable: e.is_timeout() || e.is_connect(),
            message: format!("HTTP request failed: {e}"),
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(AttemptError {
                retryable: is_retryable_status(status.as_u16()),
                message: format!("HTTP error {status}: {body}"),
            });
        }

        response.json::<Value>().map_err(|e| AttemptError {
            retryable: false,
            message: format!("invalid JSON response: {e}"),
        })
    }
}

impl EmbeddingProvider for ApiEmbedder {
    fn embed_text(&self, text: &str) -> Result<Embedding, EmbedError> {
        self.embed(ApiInput::Text(text))
    }

    fn embed_image(&self, image: &ImageSource) -> Result<Embedding, EmbedError> {
        let bytes = image.read_bytes()?;
        self.embed(ApiInput::Image(BASE64.encode(bytes)))
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn api_provider_kind(provider: Option<&str>) -> ApiProviderKind {
    match provider.unwrap_or("custom").to_ascii_lowercase().as_str() {
        "hf" | "huggingface" => ApiProviderKind::HuggingFace,
        "openai" | "gpt" => ApiProviderKind::OpenAI,
        _ => ApiProviderKind::Custom,
    }
}

fn build_api_payload(provider: ApiProviderKind, input: &ApiInput<'_>, model_name: &str) -> Value {
    match (provider, input) {
        (ApiProviderKind::HuggingFace, ApiInput::Text(text)) => json!({ "inputs": text }),
        (ApiProviderKind::HuggingFace, ApiInput::Image(b64)) => {
            json!({ "inputs": { "image": b64 } })
        }
        (ApiProviderKind::OpenAI, ApiInput::Text(text)) => {
            json!({ "input": text, "model": model_name })
        }
        (ApiProviderKind::OpenAI, ApiInput::Image(b64)) => json!({
            "input": [{ "image": format!("data:image/*;base64,{b64}") }],
            "model": model_name,
        }),
        (ApiProviderKind::Custom, ApiInput::Text(text)) => json!({ "text": text }),
        (ApiProviderKind::Custom, ApiInput::Image(b64)) => json!({ "image": b64 }),
    }
}

fn first_embedding(response: Value) -> Result<Vec<f32>, EmbedError> {
    parse_embeddings_from_value(response)?
        .into_iter()
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EmbedError::Inference("API response did not contain embeddings".into()))
}

fn parse_embeddings_from_value(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Object(mut map) => {
            if let Some(embeddings) = map.remove("embeddings") {
                return parse_embedding_collection(embeddings);
            }
            if let Some(embedding) = map.remove("embedding") {
                return parse_embedding_vector(embedding).map(|v| vec![v]);
            }

            if let Some(Value::Array(items)) = map.remove("data") {
                let mut vectors = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::Object(mut obj) => match obj.remove("embedding") {
                            Some(embedding) => vectors.push(parse_embedding_vector(embedding)?),
                            None => {
                                return Err(EmbedError::Inference(
                                    "missing `embedding` field in data item".into(),
                                ))
                            }
                        },
                        _ => {
                            return Err(EmbedError::Inference(
                                "unexpected entry inside `data` array".into(),
                            ))
                        }
                    }
                }
                return Ok(vectors);
            }

            Err(EmbedError::Inference("unsupported API response shape".into()))
        }
        other => parse_embedding_collection(other),
    }
}

fn parse_embedding_collection(value: Value) -> Result<Vec<Vec<f32>>, EmbedError> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                Ok(Vec::new())
            } else if items.iter().all(|item| matches!(item, Value::Array(_))) {
                items.into_iter().map(parse_embedding_vector).collect()
            } else {
                parse_embedding_vector(Value::Array(items)).map(|vec| vec![vec])
            }
        }
        other => parse_embedding_vector(other).map(|vec| vec![vec]),
    }
}

fn parse_embedding_vector(value: Value) -> Result<Vec<f32>, EmbedError> {
    match value {
        Value::Array(values) => values
            .into_iter()
            .map(|entry| match entry {
                Value::Number(num) => num
                    .as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| EmbedError::Inference("non-finite embedding value".into())),
                other => Err(EmbedError::Inference(format!(
                    "embedding entries must be numbers, got {other:?}"
                ))),
            })
            .collect(),
        other => Err(EmbedError::Inference(format!(
            "embedding vector must be an array, got {other:?}"
        ))),
    }
}
