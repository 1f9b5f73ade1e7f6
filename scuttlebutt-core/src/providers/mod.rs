//! Analysis backend implementations and shared HTTP retry helpers.
//!
//! Provides concrete implementations of the `AnalysisClient` trait for:
//! - OpenAI-compatible chat completions (OpenAI, OpenRouter, vLLM, LM Studio)
//! - Ollama native chat
//!
//! Use `create_analysis_client()` to instantiate the backend once at startup.

pub mod ollama;
pub mod openai_compat;

use crate::analysis::AnalysisClient;
use crate::config::LlmConfig;
use crate::error::{ConfigError, FinanceError, SearchError};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

pub use crate::config::RetryConfig;
pub use ollama::OllamaClient;
pub use openai_compat::OpenAiCompatibleClient;

/// Errors that may be transient and worth another attempt.
pub trait Retryable: Display {
    /// Whether the failure is transient (HTTP 429 or 5xx).
    fn is_retryable(&self) -> bool;

    /// Server-requested delay, if the failure carried one.
    fn retry_after_secs(&self) -> Option<u64> {
        None
    }
}

impl Retryable for SearchError {
    fn is_retryable(&self) -> bool {
        match self {
            SearchError::RateLimited { .. } => true,
            SearchError::Status { status, .. } => *status >= 500,
            _ => false,
        }
    }

    fn retry_after_secs(&self) -> Option<u64> {
        match self {
            SearchError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

impl Retryable for FinanceError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FinanceError::RateLimited { .. } | FinanceError::Server { .. }
        )
    }

    fn retry_after_secs(&self) -> Option<u64> {
        match self {
            FinanceError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        }
    }
}

/// Execute an async operation with exponential backoff retry on transient errors.
///
/// Permanent errors return immediately. After `max_retries` retries the last
/// error is returned.
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) => {
                if !e.is_retryable() || attempt >= config.max_retries {
                    return Err(e);
                }

                let backoff_ms = compute_backoff(config, attempt, &e);
                tracing::warn!(
                    attempt = attempt + 1,
                    max = config.max_retries,
                    backoff_ms = backoff_ms,
                    error = %e,
                    "Retrying after transient error"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                attempt += 1;
            }
        }
    }
}

/// Compute backoff delay, respecting rate limit retry-after values.
fn compute_backoff<E: Retryable>(config: &RetryConfig, attempt: u32, err: &E) -> u64 {
    let computed = compute_exponential_backoff(config, attempt);
    match err.retry_after_secs() {
        Some(secs) => (secs * 1000).max(computed),
        None => computed,
    }
}

/// Pure exponential backoff with optional jitter.
fn compute_exponential_backoff(config: &RetryConfig, attempt: u32) -> u64 {
    let base = config.initial_backoff_ms as f64 * config.backoff_multiplier.powi(attempt as i32);
    let capped = base.min(config.max_backoff_ms as f64) as u64;
    if config.jitter {
        // up to 25%
        let jitter = (capped as f64 * 0.25 * rand_simple()) as u64;
        capped + jitter
    } else {
        capped
    }
}

/// Cheap pseudo-random fraction in [0, 1) from the clock.
fn rand_simple() -> f64 {
    use std::time::SystemTime;
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as f64 / 1000.0
}

/// Parse a `Retry-After` header in seconds.
///
/// Accepts integer or fractional seconds ("2", "0.5s"); anything else,
/// including HTTP dates, falls back to a conservative 5 seconds.
pub fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    let value = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())?;

    if let Ok(secs) = value.trim().parse::<u64>() {
        return Some(secs);
    }
    if let Ok(secs) = value.trim().trim_end_matches('s').parse::<f64>() {
        return Some(secs.ceil() as u64);
    }
    Some(5)
}

/// Build a `reqwest` client with a total request timeout.
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::HttpClient {
            message: e.to_string(),
        })
}

/// Create the analysis client selected by `config.provider`.
///
/// Routes to the appropriate implementation:
/// - `"ollama"` → `OllamaClient` (native `/api/chat`)
/// - Everything else → `OpenAiCompatibleClient` (OpenRouter, OpenAI, local servers)
///
/// Called once at startup; the returned client is shared for the process lifetime.
pub fn create_analysis_client(config: &LlmConfig) -> Result<Arc<dyn AnalysisClient>, ConfigError> {
    if config.model.trim().is_empty() {
        return Err(ConfigError::Invalid {
            message: "llm.model must not be empty".to_string(),
        });
    }
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaClient::new(config)?)),
        _ => Ok(Arc::new(OpenAiCompatibleClient::new(config)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_retry(max_retries: u32) -> RetryConfig {
        RetryConfig {
            max_retries,
            initial_backoff_ms: 1,
            max_backoff_ms: 5,
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    #[test]
    fn test_create_client_rejects_empty_model() {
        let config = LlmConfig {
            model: "  ".to_string(),
            api_key: Some("k".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            create_analysis_client(&config),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_create_client_ollama() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            model: "llama3.2".to_string(),
            ..Default::default()
        };
        let client = create_analysis_client(&config).unwrap();
        assert_eq!(client.model_identifier(), "ollama-llama3.2");
    }

    #[test]
    fn test_create_client_openrouter_with_inline_key() {
        let config = LlmConfig {
            api_key: Some("sk-test".to_string()),
            ..Default::default()
        };
        let client = create_analysis_client(&config).unwrap();
        assert_eq!(client.model_identifier(), "openrouter-openai/gpt-4o-mini");
    }

    #[test]
    fn test_create_client_missing_key() {
        // SAFETY: test-only env var manipulation
        unsafe { std::env::remove_var("SCUTTLEBUTT_NONEXISTENT_KEY") };
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key_env: "SCUTTLEBUTT_NONEXISTENT_KEY".to_string(),
            ..Default::default()
        };
        let err = create_analysis_client(&config).err().unwrap();
        assert!(matches!(err, ConfigError::EnvVarMissing { var } if var == "SCUTTLEBUTT_NONEXISTENT_KEY"));
    }

    #[test]
    fn test_is_retryable() {
        assert!(SearchError::RateLimited { retry_after_secs: 1 }.is_retryable());
        assert!(
            SearchError::Status {
                status: 502,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !SearchError::Status {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            FinanceError::Server {
                status: 500,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !FinanceError::Status {
                status: 404,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !FinanceError::CikNotFound {
                symbol: "X".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_compute_backoff_exponential() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 60000,
            backoff_multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(compute_exponential_backoff(&config, 0), 1000);
        assert_eq!(compute_exponential_backoff(&config, 1), 2000);
        assert_eq!(compute_exponential_backoff(&config, 2), 4000);
    }

    #[test]
    fn test_compute_backoff_respects_cap() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 3000,
            backoff_multiplier: 2.0,
            jitter: false,
        };
        assert_eq!(compute_exponential_backoff(&config, 2), 3000);
    }

    #[test]
    fn test_compute_backoff_rate_limit_uses_server_value() {
        let config = RetryConfig {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 60000,
            backoff_multiplier: 2.0,
            jitter: false,
        };
        let err = FinanceError::RateLimited {
            retry_after_secs: 30,
        };
        assert_eq!(compute_backoff(&config, 0, &err), 30000);
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = reqwest::header::HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
        headers.insert(reqwest::header::RETRY_AFTER, "7".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(7));
        headers.insert(reqwest::header::RETRY_AFTER, "0.5s".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(1));
        headers.insert(
            reqwest::header::RETRY_AFTER,
            "Wed, 21 Oct 2015 07:28:00 GMT".parse().unwrap(),
        );
        assert_eq!(parse_retry_after(&headers), Some(5));
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_first_try() {
        let result = with_retry(&fast_retry(3), || async { Ok::<_, FinanceError>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_with_retry_permanent_error_no_retry() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry(&fast_retry(3), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<i32, _>(FinanceError::Status {
                    status: 404,
                    body: "not found".into(),
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_with_retry_transient_then_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry(&fast_retry(3), || {
            let c = c.clone();
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FinanceError::Server {
                        status: 503,
                        body: "busy".into(),
                    })
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_exhausts() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = calls.clone();
        let result = with_retry(&fast_retry(2), || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(SearchError::Status {
                    status: 500,
                    body: String::new(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(SearchError::Status { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
