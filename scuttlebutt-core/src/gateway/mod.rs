//! # HTTP Gateway
//!
//! A small JSON API over the research pipeline and the ROE lookup.
//!
//! | Route | Method | Purpose |
//! |---|---|---|
//! | `/` | GET | Service name and version |
//! | `/health` | GET | Liveness probe |
//! | `/fisher-research` | POST | Run Scuttlebutt research for one company |
//! | `/roe/{symbol}` | GET | Return-on-equity from SEC filings |

mod api;
mod server;

pub use api::{ApiError, FisherResearchRequest, FisherResearchResponse};
pub use server::{AppState, SharedState, router as gateway_router, run as run_gateway};

use serde::{Deserialize, Serialize};

/// Configuration for the HTTP gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Origins allowed by CORS. Empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
        }
    }
}

impl GatewayConfig {
    /// `host:port` socket address string.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
