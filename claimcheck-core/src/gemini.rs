//! Google Gemini API backend.
//!
//! Talks to the `generateContent` endpoint with the `googleSearch` tool
//! enabled, so every reply can carry grounding metadata citing the web
//! sources the model consulted.
//!
//! Key API traits:
//! - Auth via `?key=API_KEY` query parameter (not header-based)
//! - Grounding citations arrive under `candidates[0].groundingMetadata`;
//!   their absence is valid (the model may answer without searching)

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::backend::{GroundedBackend, GroundedReply, with_retry};
use crate::config::{BackendConfig, RetryConfig};
use crate::error::BackendError;
use crate::types::GroundingChunk;

/// The default Google Gemini API base URL.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Gemini API backend with web-search grounding.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    timeout_secs: u64,
    retry: RetryConfig,
}

impl GeminiBackend {
    /// Create a new Gemini backend from configuration.
    ///
    /// Reads the API key from the environment variable named in
    /// `config.api_key_env`. Returns `BackendError::AuthFailed` if it is
    /// unset or empty.
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| BackendError::AuthFailed {
                provider: format!("Gemini (env var '{}' not set)", config.api_key_env),
            })?;
        Self::new_with_key(config, api_key)
    }

    /// Create a new Gemini backend with an explicitly provided API key.
    pub fn new_with_key(config: &BackendConfig, api_key: String) -> Result<Self, BackendError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| BackendError::Connection {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url,
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
            retry: config.retry.clone(),
        })
    }

    /// Build the JSON request body for a grounded generation call.
    ///
    /// The `googleSearch` tool is always attached; the instruction template
    /// depends on search results being available.
    fn build_request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{"text": prompt}],
            }],
            "tools": [{"googleSearch": {}}],
            "generationConfig": {
                "temperature": self.temperature,
            },
        })
    }

    /// Build the endpoint URL with the `?key=` query parameter.
    fn endpoint_url(&self, method: &str) -> String {
        format!(
            "{}/models/{}:{}?key={}",
            self.base_url, self.model, method, self.api_key
        )
    }

    /// Parse a Gemini API response into a `GroundedReply`.
    ///
    /// The reply text is the concatenation of all text parts of the first
    /// candidate. Grounding metadata is optional; chunks that do not
    /// deserialize are dropped rather than failing the reply.
    fn parse_reply(body: &Value) -> Result<GroundedReply, BackendError> {
        let candidates = body["candidates"]
            .as_array()
            .ok_or_else(|| BackendError::ResponseParse {
                message: "Missing 'candidates' array in response".to_string(),
            })?;

        if candidates.is_empty() {
            return Err(BackendError::ResponseParse {
                message: "Empty 'candidates' array in response".to_string(),
            });
        }

        let candidate = &candidates[0];
        let parts =
            candidate["content"]["parts"]
                .as_array()
                .ok_or_else(|| BackendError::ResponseParse {
                    message: "Missing 'parts' array in candidate content".to_string(),
                })?;

        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();

        let chunks: Vec<GroundingChunk> =
            match candidate["groundingMetadata"]["groundingChunks"].as_array() {
                Some(raw_chunks) => raw_chunks
                    .iter()
                    .filter_map(|chunk| serde_json::from_value(chunk.clone()).ok())
                    .collect(),
                None => Vec::new(),
            };

        Ok(GroundedReply { text, chunks })
    }

    /// Map an HTTP status code to the appropriate `BackendError`.
    fn map_http_error(status: reqwest::StatusCode, body_text: &str) -> BackendError {
        match status.as_u16() {
            401 | 403 => BackendError::AuthFailed {
                provider: "Gemini".to_string(),
            },
            429 => BackendError::RateLimited {
                retry_after_secs: 30,
            },
            _ => BackendError::ApiRequest {
                message: format!("HTTP {} from Gemini API: {}", status, body_text),
            },
        }
    }

    /// One attempt at a grounded generation call.
    async fn generate_once(&self, prompt: &str) -> Result<GroundedReply, BackendError> {
        let url = self.endpoint_url("generateContent");
        let body = self.build_request_body(prompt);

        debug!(
            model = self.model.as_str(),
            "Sending grounded generation request"
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else if e.is_connect() {
                    BackendError::Connection {
                        message: format!("Connection to Gemini API failed: {}", e),
                    }
                } else {
                    BackendError::ApiRequest {
                        message: format!("Request to Gemini API failed: {}", e),
                    }
                }
            })?;

        let status = response.status();
        let body_text = response
            .text()
            .await
            .map_err(|e| BackendError::ResponseParse {
                message: format!("Failed to read response body: {}", e),
            })?;

        if !status.is_success() {
            return Err(Self::map_http_error(status, &body_text));
        }

        let response_json: Value =
            serde_json::from_str(&body_text).map_err(|e| BackendError::ResponseParse {
                message: format!("Invalid JSON in response: {}", e),
            })?;

        Self::parse_reply(&response_json)
    }
}

#[async_trait]
impl GroundedBackend for GeminiBackend {
    /// Perform a grounded generation call, retrying transient failures.
    async fn generate(&self, prompt: &str) -> Result<GroundedReply, BackendError> {
        with_retry(&self.retry, || self.generate_once(prompt)).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
