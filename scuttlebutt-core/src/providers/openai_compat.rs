//! OpenAI-compatible analysis client.
//!
//! Supports OpenRouter, OpenAI, and any endpoint that follows the OpenAI chat
//! completions API format.

use crate::analysis::AnalysisClient;
use crate::config::LlmConfig;
use crate::error::{AnalysisError, ConfigError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// OpenAI-compatible chat completions client.
pub struct OpenAiCompatibleClient {
    client: Client,
    base_url: String,
    api_key: String,
    provider: String,
    model: String,
    temperature: f32,
    json_mode: bool,
    max_tokens: Option<usize>,
    timeout_secs: u64,
}

impl OpenAiCompatibleClient {
    /// Create a new client from configuration.
    ///
    /// The API key comes from `config.api_key` or the env var named by
    /// `config.api_key_env`. Local endpoints need no key.
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let is_local = config
            .base_url
            .as_ref()
            .map(|u| u.contains("localhost") || u.contains("127.0.0.1"))
            .unwrap_or(false);

        let api_key = match config.resolve_api_key() {
            Ok(key) => key,
            Err(_) if is_local => {
                debug!("No API key set for local endpoint; using dummy bearer token");
                "local".to_string()
            }
            Err(e) => return Err(e),
        };
        Self::new_with_key(config, api_key)
    }

    /// Create a new client with an explicitly provided API key.
    pub fn new_with_key(config: &LlmConfig, api_key: String) -> Result<Self, ConfigError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| match config.provider.as_str() {
                "openai" => OPENAI_BASE_URL.to_string(),
                _ => OPENROUTER_BASE_URL.to_string(),
            });

        Ok(Self {
            client: super::http_client(Duration::from_secs(config.timeout_secs))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            provider: config.provider.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            json_mode: config.json_mode,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
        })
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str) -> Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": self.temperature,
            "stream": false,
        });
        if self.json_mode {
            body["response_format"] = json!({ "type": "json_object" });
        }
        if let Some(max_tokens) = self.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }

    /// Extract `choices[0].message.content` from a response body.
    fn parse_response(body: &Value) -> Result<String, AnalysisError> {
        let choice = body
            .get("choices")
            .and_then(|c| c.get(0))
            .ok_or_else(|| AnalysisError::ResponseParse {
                message: "No choices in response".to_string(),
            })?;

        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AnalysisError::ResponseParse {
                message: "No message content in choice".to_string(),
            })
    }

    fn map_http_error(&self, status: reqwest::StatusCode, retry_after: Option<u64>, body: &str) -> AnalysisError {
        match status.as_u16() {
            401 | 403 => {
                debug!(body = %body, "Authentication failed ({})", status);
                AnalysisError::AuthFailed {
                    provider: self.provider.clone(),
                }
            }
            429 => AnalysisError::RateLimited {
                retry_after_secs: retry_after.unwrap_or(5),
            },
            status if status >= 500 => AnalysisError::ApiRequest {
                message: format!("Server error ({}): {}", status, body),
            },
            _ => AnalysisError::ApiRequest {
                message: format!("HTTP {}: {}", status, body),
            },
        }
    }

    fn map_send_error(&self, e: reqwest::Error) -> AnalysisError {
        if e.is_timeout() {
            AnalysisError::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else if e.is_connect() {
            AnalysisError::Connection {
                message: e.to_string(),
            }
        } else {
            AnalysisError::ApiRequest {
                message: format!("Request failed: {}", e),
            }
        }
    }
}

#[async_trait]
impl AnalysisClient for OpenAiCompatibleClient {
    async fn analyze(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(system_prompt, user_prompt);

        debug!(url = %url, model = %self.model, "Sending chat completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let retry_after = super::parse_retry_after(response.headers());
        let response_body = response.text().await.map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(self.map_http_error(status, retry_after, &response_body));
        }

        let json: Value =
            serde_json::from_str(&response_body).map_err(|e| AnalysisError::ResponseParse {
                message: format!("Invalid JSON: {}", e),
            })?;

        Self::parse_response(&json)
    }

    fn model_identifier(&self) -> String {
        format!("{}-{}", self.provider, self.model)
    }
}
