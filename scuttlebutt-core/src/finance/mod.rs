//! Return-on-equity lookups from regulatory filings.

pub mod sec_edgar;

use crate::error::FinanceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use sec_edgar::SecEdgarClient;

/// ROE for one company, computed from its latest reported facts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoeReport {
    pub symbol: String,
    /// Zero-padded 10-digit CIK.
    pub cik: String,
    pub net_income: f64,
    pub stockholders_equity: f64,
    /// Percentage: net income / equity × 100.
    pub roe: f64,
}

/// A source of return-on-equity figures.
#[async_trait]
pub trait RoeProvider: Send + Sync {
    async fn roe(&self, symbol: &str) -> Result<RoeReport, FinanceError>;
}

/// Zero-pad a CIK to the 10 digits EDGAR URLs expect.
pub fn pad_cik(cik: u64) -> String {
    format!("{cik:010}")
}

/// Latest value (by `end` date) from an XBRL company-concept document.
///
/// Looks in `preferred_unit` first, then in any unit that has a numeric value.
pub fn latest_value(concept: &Value, preferred_unit: &str) -> Option<f64> {
    let units = concept.get("units")?.as_object()?;

    let latest_in = |facts: &Value| -> Option<f64> {
        facts
            .as_array()?
            .iter()
            .filter_map(|f| {
                let end = f.get("end").and_then(Value::as_str).unwrap_or("");
                f.get("val").and_then(Value::as_f64).map(|v| (end, v))
            })
            .max_by(|a, b| a.0.cmp(b.0))
            .map(|(_, v)| v)
    };

    units
        .get(preferred_unit)
        .and_then(latest_in)
        .or_else(|| units.values().find_map(latest_in))
}

/// ROE percentage, or `None` when equity is zero.
pub fn compute_roe(net_income: f64, equity: f64) -> Option<f64> {
    if equity == 0.0 {
        return None;
    }
    Some(net_income / equity * 100.0)
}
