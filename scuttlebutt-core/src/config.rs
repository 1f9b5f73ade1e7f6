//! Configuration system for Scuttlebutt.
//!
//! Uses `figment` for layered configuration: defaults -> config file -> environment -> CLI args.
//! Configuration is loaded from `~/.config/scuttlebutt/config.toml` and/or
//! `.scuttlebutt/config.toml` in the workspace directory.
//!
//! The loaded [`ScuttlebuttConfig`] is built once at startup and passed by
//! reference into every component constructor; nothing reads ambient state later.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::gateway::GatewayConfig;
use crate::search::SearchConfig;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScuttlebuttConfig {
    pub search: SearchConfig,
    pub llm: LlmConfig,
    pub research: ResearchConfig,
    pub finance: FinanceConfig,
    pub gateway: GatewayConfig,
    pub retry: RetryConfig,
}

/// LLM analysis backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// Backend name: "openrouter", "openai", or "ollama".
    pub provider: String,
    /// Model identifier (e.g., "openai/gpt-4o-mini", "llama3.2").
    pub model: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Inline API key; takes precedence over `api_key_env`. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// Optional base URL override for the API endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Response timeout in seconds; generation latency dominates.
    pub timeout_secs: u64,
    /// Request JSON-structured output when the backend supports it.
    pub json_mode: bool,
    /// Optional cap on generated tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<usize>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openrouter".to_string(),
            model: "openai/gpt-4o-mini".to_string(),
            api_key_env: "OPENROUTER_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            temperature: 0.7,
            timeout_secs: 120,
            json_mode: true,
            max_tokens: None,
        }
    }
}

impl LlmConfig {
    /// Validate this LLM config and return any warnings.
    ///
    /// Returns an empty Vec if the config is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.temperature < 0.0 || self.temperature > 2.0 {
            warnings.push(format!(
                "temperature ({}) is outside the usual 0.0-2.0 range",
                self.temperature
            ));
        }
        if self.timeout_secs == 0 {
            warnings.push("llm.timeout_secs is 0; every analysis call will time out".into());
        }
        if self.model.trim().is_empty() {
            warnings.push("llm.model is empty".into());
        }
        warnings
    }

    /// Resolve the API key from the inline value or the configured env var.
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        resolve_key(self.api_key.as_deref(), &self.api_key_env)
    }
}

/// How strictly model ratings are checked after field validation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationPolicy {
    /// Accept any integer rating and criterion id.
    #[default]
    Lenient,
    /// Require rating in 1..=5, criterion id in 1..=15, and unique ids.
    Strict,
}

/// Research pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Maximum records kept per stakeholder bucket.
    pub max_results_per_bucket: usize,
    /// Concurrent search queries during aggregation (1 = sequential).
    pub search_concurrency: usize,
    /// Upper bound on a whole research run, in seconds.
    pub request_timeout_secs: u64,
    pub validation_policy: ValidationPolicy,
    /// Cap on fallback source URLs merged into ratings without sources.
    pub max_fallback_sources: usize,
    /// Write signals and results as JSON into `artifact_dir`.
    pub persist_artifacts: bool,
    pub artifact_dir: PathBuf,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            max_results_per_bucket: 5,
            search_concurrency: 4,
            request_timeout_secs: 300,
            validation_policy: ValidationPolicy::Lenient,
            max_fallback_sources: 10,
            persist_artifacts: false,
            artifact_dir: PathBuf::from(".tmp"),
        }
    }
}

/// Regulatory-filing lookups used for return-on-equity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinanceConfig {
    pub sec_base_url: String,
    /// SEC requires a descriptive User-Agent with contact details.
    pub sec_user_agent: String,
    /// Static symbol -> CIK JSON mapping consulted before the remote ticker list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cik_mapping_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for FinanceConfig {
    fn default() -> Self {
        Self {
            sec_base_url: "https://data.sec.gov".to_string(),
            sec_user_agent: "Scuttlebutt research contact@example.com".to_string(),
            cik_mapping_path: None,
            timeout_secs: 10,
        }
    }
}

/// Bounded exponential backoff for transient upstream failures (HTTP 429 and 5xx).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            backoff_multiplier: 2.0,
            jitter: true,
        }
    }
}

impl ScuttlebuttConfig {
    /// Collect warnings from every section.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = self.llm.validate();
        if self.research.max_results_per_bucket == 0 {
            warnings.push("research.max_results_per_bucket is 0; every bucket will be empty".into());
        }
        if self.research.search_concurrency == 0 {
            warnings.push("research.search_concurrency is 0; treating it as 1".into());
        }
        if self.research.request_timeout_secs < self.llm.timeout_secs {
            warnings.push(format!(
                "research.request_timeout_secs ({}) is shorter than llm.timeout_secs ({})",
                self.research.request_timeout_secs, self.llm.timeout_secs
            ));
        }
        if self.retry.max_retries > 10 {
            warnings.push(format!(
                "retry.max_retries ({}) is unusually high",
                self.retry.max_retries
            ));
        }
        warnings
    }
}

pub(crate) fn resolve_key(inline: Option<&str>, env_var: &str) -> Result<String, ConfigError> {
    if let Some(key) = inline
        && !key.is_empty()
    {
        return Ok(key.to_string());
    }
    std::env::var(env_var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::EnvVarMissing {
            var: env_var.to_string(),
        })
}

fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "scuttlebutt", "scuttlebutt")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Path of the workspace-level config file.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".scuttlebutt").join("config.toml")
}

/// Load configuration with layered sources.
///
/// Precedence (lowest to highest):
/// 1. Built-in defaults
/// 2. User config (`~/.config/scuttlebutt/config.toml`)
/// 3. Workspace config (`.scuttlebutt/config.toml`)
/// 4. Environment variables (`SCUTTLEBUTT_` prefix, `__` for nesting)
/// 5. Explicit overrides
pub fn load_config(
    workspace: Option<&Path>,
    overrides: Option<&ScuttlebuttConfig>,
) -> Result<ScuttlebuttConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(ScuttlebuttConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    // SCUTTLEBUTT_LLM__MODEL, SCUTTLEBUTT_RESEARCH__MAX_RESULTS_PER_BUCKET, ...
    figment = figment.merge(Env::prefixed("SCUTTLEBUTT_").split("__"));

    if let Some(overrides) = overrides {
        figment = figment.merge(Serialized::defaults(overrides));
    }

    figment.extract().map_err(Box::new)
}

/// Check whether any configuration file exists (user-level or workspace-level).
pub fn config_exists(workspace: Option<&Path>) -> bool {
    if user_config_path().is_some_and(|p| p.exists()) {
        return true;
    }
    workspace.is_some_and(|ws| workspace_config_path(ws).exists())
}
