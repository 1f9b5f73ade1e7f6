//! Ollama native chat client (`POST /api/chat`).

use crate::analysis::AnalysisClient;
use crate::config::LlmConfig;
use crate::error::{AnalysisError, ConfigError};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::debug;

const OLLAMA_BASE_URL: &str = "http://localhost:11434";

/// Client for a local or remote Ollama server.
pub struct OllamaClient {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    json_mode: bool,
    timeout_secs: u64,
}

impl OllamaClient {
    pub fn new(config: &LlmConfig) -> Result<Self, ConfigError> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| OLLAMA_BASE_URL.to_string());
        Ok(Self {
            client: super::http_client(Duration::from_secs(config.timeout_secs))?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            json_mode: config.json_mode,
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
            "stream": false,
            "options": { "temperature": self.temperature },
        });
        if self.json_mode {
            body["format"] = json!("json");
        }
        body
    }

    fn parse_response(body: &Value) -> Result<String, AnalysisError> {
        body.get("message")
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .map(|s| s.to_string())
            .ok_or_else(|| AnalysisError::ResponseParse {
                message: "No message content in Ollama response".to_string(),
            })
    }
}

#[async_trait]
impl AnalysisClient for OllamaClient {
    async fn analyze(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AnalysisError> {
        let url = format!("{}/api/chat", self.base_url);
        debug!(url = %url, model = %self.model, "Sending Ollama chat request");

        let response = self
            .client
            .post(&url)
            .json(&self.request_body(system_prompt, user_prompt))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AnalysisError::Timeout {
                        timeout_secs: self.timeout_secs,
                    }
                } else {
                    AnalysisError::Connection {
                        message: format!("Ollama unreachable at {}: {}", self.base_url, e),
                    }
                }
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| AnalysisError::ApiRequest {
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(AnalysisError::ApiRequest {
                message: format!("HTTP {}: {}", status.as_u16(), text),
            });
        }

        let json: Value = serde_json::from_str(&text).map_err(|e| AnalysisError::ResponseParse {
            message: format!("Invalid JSON: {}", e),
        })?;
        Self::parse_response(&json)
    }

    fn model_identifier(&self) -> String {
        format!("ollama-{}", self.model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OllamaClient {
        OllamaClient::new(&LlmConfig {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_defaults() {
        let c = client();
        assert_eq!(c.base_url, OLLAMA_BASE_URL);
        assert_eq!(c.model_identifier(), "ollama-llama3.2");
    }

    #[test]
    fn test_request_body() {
        let body = client().request_body("sys", "usr");
        assert_eq!(body["stream"], false);
        assert_eq!(body["format"], "json");
        assert_eq!(body["messages"][0]["content"], "sys");
    }

    #[test]
    fn test_parse_response() {
        let body = json!({ "message": { "role": "assistant", "content": "{}" }, "done": true });
        assert_eq!(OllamaClient::parse_response(&body).unwrap(), "{}");
        assert!(OllamaClient::parse_response(&json!({ "done": true })).is_err());
    }
}
