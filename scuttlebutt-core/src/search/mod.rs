//! Web-search providers that turn a free-text query into signal records.

pub mod tavily;

use crate::types::SignalRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use tavily::TavilyClient;

/// A web-search backend.
///
/// Implementations fail soft: any transport, status, or decoding failure is
/// logged and yields an empty list, so one bad query never aborts a run.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one query and return at most `max_results` records plus an optional summary.
    ///
    /// Returned records carry a placeholder bucket; the aggregator re-tags them.
    async fn search(&self, query: &str, max_results: usize) -> Vec<SignalRecord>;
}

/// Web-search provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Search endpoint URL.
    pub endpoint: String,
    /// Environment variable name containing the API key.
    pub api_key_env: String,
    /// Inline API key; takes precedence over `api_key_env`. Never serialized.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    /// "basic" or "advanced".
    pub search_depth: String,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.tavily.com/search".to_string(),
            api_key_env: "TAVILY_API_KEY".to_string(),
            api_key: None,
            search_depth: "advanced".to_string(),
            timeout_secs: 30,
        }
    }
}
