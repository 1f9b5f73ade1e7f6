//! Tavily-compatible search client.

use super::{SearchConfig, SearchProvider};
use crate::config::{RetryConfig, resolve_key};
use crate::error::{ConfigError, SearchError};
use crate::providers::{http_client, parse_retry_after, with_retry};
use crate::types::{SignalRecord, StakeholderBucket};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

/// Title given to the synthesized answer record.
pub const SUMMARY_TITLE: &str = "Search Summary";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
    #[serde(default)]
    answer: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(default)]
    url: String,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    snippet: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    score: Option<f64>,
}

impl SearchHit {
    fn into_record(self) -> SignalRecord {
        let snippet = self
            .content
            .filter(|c| !c.is_empty())
            .or(self.snippet)
            .unwrap_or_default();
        SignalRecord {
            source_url: self.url,
            snippet,
            title: self.title,
            relevance_score: self.score.unwrap_or(0.0),
            stakeholder_bucket: StakeholderBucket::Customers,
        }
    }
}

/// Client for a Tavily-style `POST /search` endpoint.
pub struct TavilyClient {
    client: Client,
    endpoint: String,
    api_key: String,
    search_depth: String,
    retry: RetryConfig,
}

impl TavilyClient {
    /// Create a client, resolving the API key now so a missing key fails at startup.
    pub fn new(config: &SearchConfig, retry: &RetryConfig) -> Result<Self, ConfigError> {
        let api_key = resolve_key(config.api_key.as_deref(), &config.api_key_env)?;
        Ok(Self {
            client: http_client(Duration::from_secs(config.timeout_secs))?,
            endpoint: config.endpoint.clone(),
            api_key,
            search_depth: config.search_depth.clone(),
            retry: retry.clone(),
        })
    }

    async fn try_search(&self, query: &str, max_results: usize) -> Result<Vec<SignalRecord>, SearchError> {
        let body = json!({
            "api_key": self.api_key,
            "query": query,
            "search_depth": self.search_depth,
            "max_results": max_results,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(SearchError::RateLimited {
                retry_after_secs: parse_retry_after(response.headers()).unwrap_or(5),
            });
        }
        let text = response.text().await.map_err(|e| SearchError::Request {
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(SearchError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: SearchResponse =
            serde_json::from_str(&text).map_err(|e| SearchError::ResponseParse {
                message: e.to_string(),
            })?;
        Ok(normalize(parsed))
    }
}

/// Summary first, then hits in provider order.
fn normalize(response: SearchResponse) -> Vec<SignalRecord> {
    let mut records = Vec::with_capacity(response.results.len() + 1);
    if let Some(answer) = response.answer.filter(|a| !a.trim().is_empty()) {
        records.push(SignalRecord {
            source_url: String::new(),
            snippet: answer,
            title: SUMMARY_TITLE.to_string(),
            relevance_score: 1.0,
            stakeholder_bucket: StakeholderBucket::Customers,
        });
    }
    records.extend(response.results.into_iter().map(SearchHit::into_record));
    records
}

#[async_trait]
impl SearchProvider for TavilyClient {
    async fn search(&self, query: &str, max_results: usize) -> Vec<SignalRecord> {
        match with_retry(&self.retry, || self.try_search(query, max_results)).await {
            Ok(records) => {
                debug!(query, count = records.len(), "Search completed");
                records
            }
            Err(e) => {
                warn!(query, error = %e, "Search failed; continuing with no results");
                Vec::new()
            }
        }
    }
}
