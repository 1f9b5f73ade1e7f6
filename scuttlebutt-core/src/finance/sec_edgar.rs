//! SEC EDGAR client: CIK resolution and XBRL company-concept facts.

use super::{RoeProvider, RoeReport, compute_roe, latest_value, pad_cik};
use crate::config::{FinanceConfig, RetryConfig};
use crate::error::{ConfigError, FinanceError};
use crate::providers::{http_client, parse_retry_after, with_retry};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const NET_INCOME_TAG: &str = "NetIncomeLoss";
const EQUITY_TAG: &str = "StockholdersEquity";

/// Load a static `{"AAPL": 320193, ...}` symbol → CIK mapping.
///
/// Values may be numbers or digit strings; keys are upper-cased.
pub fn load_cik_mapping(path: &Path) -> Result<HashMap<String, u64>, FinanceError> {
    let mapping_err = |message: String| FinanceError::Mapping {
        path: path.to_path_buf(),
        message,
    };
    let text = std::fs::read_to_string(path).map_err(|e| mapping_err(e.to_string()))?;
    let raw: HashMap<String, Value> =
        serde_json::from_str(&text).map_err(|e| mapping_err(e.to_string()))?;

    Ok(raw
        .into_iter()
        .filter_map(|(symbol, cik)| {
            let cik = cik
                .as_u64()
                .or_else(|| cik.as_str().and_then(|s| s.trim().parse().ok()))?;
            Some((symbol.to_uppercase(), cik))
        })
        .collect())
}

/// Client for `data.sec.gov`.
pub struct SecEdgarClient {
    client: Client,
    base_url: String,
    user_agent: String,
    mapping: HashMap<String, u64>,
    retry: RetryConfig,
}

impl SecEdgarClient {
    /// Build a client; an unreadable mapping file is logged and treated as empty.
    pub fn new(config: &FinanceConfig, retry: &RetryConfig) -> Result<Self, ConfigError> {
        let mapping = match &config.cik_mapping_path {
            Some(path) => load_cik_mapping(path).unwrap_or_else(|e| {
                warn!(error = %e, "Could not load CIK mapping; using remote lookup only");
                HashMap::new()
            }),
            None => HashMap::new(),
        };
        Ok(Self {
            client: http_client(Duration::from_secs(config.timeout_secs))?,
            base_url: config.sec_base_url.trim_end_matches('/').to_string(),
            user_agent: config.sec_user_agent.clone(),
            mapping,
            retry: retry.clone(),
        })
    }

    /// Replace the static mapping.
    pub fn with_mapping(mut self, mapping: HashMap<String, u64>) -> Self {
        self.mapping = mapping;
        self
    }

    /// Resolve a ticker symbol to a zero-padded CIK.
    pub async fn resolve_cik(&self, symbol: &str) -> Result<String, FinanceError> {
        let symbol = symbol.trim().to_uppercase();
        if let Some(cik) = self.mapping.get(&symbol) {
            return Ok(pad_cik(*cik));
        }

        debug!(symbol = %symbol, "CIK not in static mapping; fetching ticker list");
        let tickers = self
            .get_json(&format!("{}/files/company_tickers.json", self.base_url))
            .await?;

        // {"0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}, ...}
        let found = tickers.as_object().and_then(|entries| {
            entries.values().find_map(|entry| {
                if entry.get("ticker").and_then(Value::as_str) != Some(symbol.as_str()) {
                    return None;
                }
                let cik = entry.get("cik_str")?;
                cik.as_u64()
                    .or_else(|| cik.as_str().and_then(|s| s.parse().ok()))
            })
        });

        match found {
            Some(cik) => {
                info!(symbol = %symbol, cik, "Resolved CIK from ticker list");
                Ok(pad_cik(cik))
            }
            None => Err(FinanceError::CikNotFound { symbol }),
        }
    }

    /// Latest USD value of a us-gaap concept for a CIK.
    async fn concept_value(&self, symbol: &str, cik: &str, tag: &str) -> Result<f64, FinanceError> {
        let url = format!(
            "{}/api/xbrl/companyconcept/CIK{}/us-gaap/{}.json",
            self.base_url, cik, tag
        );
        let concept = match self.get_json(&url).await {
            Ok(v) => v,
            Err(FinanceError::Status { status: 404, .. }) => {
                return Err(FinanceError::InsufficientData {
                    symbol: symbol.to_string(),
                    message: format!("no {tag} facts reported"),
                });
            }
            Err(e) => return Err(e),
        };
        latest_value(&concept, "USD").ok_or_else(|| FinanceError::InsufficientData {
            symbol: symbol.to_string(),
            message: format!("no {tag} values"),
        })
    }

    async fn get_json(&self, url: &str) -> Result<Value, FinanceError> {
        with_retry(&self.retry, || self.try_get_json(url)).await
    }

    async fn try_get_json(&self, url: &str) -> Result<Value, FinanceError> {
        let response = self
            .client
            .get(url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FinanceError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(FinanceError::RateLimited {
                retry_after_secs: parse_retry_after(response.headers()).unwrap_or(5),
            });
        }
        let body = response.text().await.map_err(|e| FinanceError::Request {
            message: e.to_string(),
        })?;
        if status.is_server_error() {
            return Err(FinanceError::Server {
                status: status.as_u16(),
                body,
            });
        }
        if !status.is_success() {
            return Err(FinanceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        serde_json::from_str(&body).map_err(|e| FinanceError::ResponseParse {
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl RoeProvider for SecEdgarClient {
    async fn roe(&self, symbol: &str) -> Result<RoeReport, FinanceError> {
        let symbol = symbol.trim().to_uppercase();
        let cik = self.resolve_cik(&symbol).await?;
        debug!(symbol = %symbol, cik = %cik, "Fetching SEC company concepts");

        let net_income = self.concept_value(&symbol, &cik, NET_INCOME_TAG).await?;
        let equity = self.concept_value(&symbol, &cik, EQUITY_TAG).await?;

        let roe = compute_roe(net_income, equity).ok_or_else(|| FinanceError::InsufficientData {
            symbol: symbol.clone(),
            message: "stockholders' equity is zero".to_string(),
        })?;
        info!(symbol = %symbol, roe, "Computed ROE from SEC filings");

        Ok(RoeReport {
            symbol,
            cik,
            net_income,
            stockholders_equity: equity,
            roe,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_cik_mapping() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cik_mapping.json");
        std::fs::write(&path, r#"{"aapl": 320193, "MSFT": "0000789019", "BAD": null}"#).unwrap();
        let mapping = load_cik_mapping(&path).unwrap();
        assert_eq!(mapping.get("AAPL"), Some(&320193));
        assert_eq!(mapping.get("MSFT"), Some(&789019));
        assert!(!mapping.contains_key("BAD"));
    }

    #[test]
    fn test_load_cik_mapping_missing_file() {
        let err = load_cik_mapping(Path::new("/nonexistent/cik.json")).unwrap_err();
        assert!(matches!(err, FinanceError::Mapping { .. }));
    }

    #[tokio::test]
    async fn test_resolve_from_static_mapping() {
        let client = SecEdgarClient::new(&FinanceConfig::default(), &RetryConfig::default())
            .unwrap()
            .with_mapping(HashMap::from([("AAPL".to_string(), 320193)]));
        assert_eq!(client.resolve_cik("aapl").await.unwrap(), "0000320193");
    }

    #[test]
    fn test_bad_mapping_path_is_not_fatal() {
        let config = FinanceConfig {
            cik_mapping_path: Some("/nonexistent/cik.json".into()),
            ..Default::default()
        };
        assert!(SecEdgarClient::new(&config, &RetryConfig::default()).is_ok());
    }
}
