//! HTTP gateway server built on axum.

use super::GatewayConfig;
use super::api::{ApiError, FisherResearchRequest, FisherResearchResponse};
use crate::finance::{RoeProvider, RoeReport};
use crate::research::ResearchOrchestrator;
use crate::types::filter_ratings;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared handler state: the pipeline and the ROE source.
pub struct AppState {
    pub research: ResearchOrchestrator,
    pub roe: Arc<dyn RoeProvider>,
}

/// Thread-safe shared state reference for axum handlers.
pub type SharedState = Arc<AppState>;

fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.is_empty() {
        return base.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    base.allow_origin(allowed)
}

/// Build the axum Router with every gateway route.
pub fn router(state: SharedState, config: &GatewayConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/fisher-research", post(fisher_research_handler))
        .route("/roe/{symbol}", get(roe_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer(&config.cors_origins)),
        )
        .with_state(state)
}

async fn root_handler() -> Json<Value> {
    Json(json!({
        "message": "Fisher Research API",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Health check endpoint.
async fn health_handler() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Runs the full pipeline, then keeps only the requested criteria.
async fn fisher_research_handler(
    State(state): State<SharedState>,
    payload: Result<Json<FisherResearchRequest>, JsonRejection>,
) -> Result<Json<FisherResearchResponse>, ApiError> {
    let Json(req) = payload?;
    if req.company_name.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            "companyName must not be empty",
        ));
    }

    let ticker = Some(req.symbol.as_str()).filter(|s| !s.trim().is_empty());
    let result = state
        .research
        .run(&req.company_name, ticker, state.research.default_max_results())
        .await?;

    Ok(Json(FisherResearchResponse {
        ratings: filter_ratings(&result.ratings, &req.criteria_to_research),
        symbol: result.symbol,
        research_date: result.research_timestamp,
        model_used: result.model_identifier,
    }))
}

async fn roe_handler(
    State(state): State<SharedState>,
    Path(symbol): Path<String>,
) -> Result<Json<RoeReport>, ApiError> {
    Ok(Json(state.roe.roe(&symbol).await?))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}

/// Serve the gateway on the configured address until Ctrl-C.
pub async fn run(state: SharedState, config: &GatewayConfig) -> crate::Result<()> {
    let app = router(state, config);
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Fisher research API listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MockAnalysisClient;
    use crate::config::ResearchConfig;
    use crate::error::FinanceError;
    use crate::search::SearchProvider;
    use crate::types::SignalRecord;
    use async_trait::async_trait;
    use axum::body::Body;
    use tower::ServiceExt;

    struct Empty;

    #[async_trait]
    impl SearchProvider for Empty {
        async fn search(&self, _q: &str, _n: usize) -> Vec<SignalRecord> {
            Vec::new()
        }
    }

    #[async_trait]
    impl RoeProvider for Empty {
        async fn roe(&self, symbol: &str) -> Result<RoeReport, FinanceError> {
            Err(FinanceError::CikNotFound {
                symbol: symbol.to_string(),
            })
        }
    }

    fn test_state() -> SharedState {
        Arc::new(AppState {
            research: ResearchOrchestrator::new(
                Arc::new(Empty),
                Arc::new(MockAnalysisClient::with_response(r#"{"ratings": []}"#)),
                &ResearchConfig::default(),
            ),
            roe: Arc::new(Empty),
        })
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = router(test_state(), &GatewayConfig::default());
        let req = axum::http::Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();
        let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(app, req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body = axum::body::to_bytes(resp.into_body(), 10_000).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn test_unknown_route_404() {
        let app = router(test_state(), &GatewayConfig::default());
        let req = axum::http::Request::builder()
            .uri("/nope")
            .body(Body::empty())
            .unwrap();
        let resp = ServiceExt::<axum::http::Request<Body>>::oneshot(app, req)
            .await
            .unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn test_run_reports_port_in_use() {
        let held = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let config = GatewayConfig {
            host: "127.0.0.1".to_string(),
            port: held.local_addr().unwrap().port(),
            ..Default::default()
        };
        let err = run(test_state(), &config).await.unwrap_err();
        assert!(matches!(err, crate::ScuttlebuttError::Io(_)));
        assert!(err.to_string().starts_with("IO error: "));
    }

    #[test]
    fn test_cors_layer_builds_for_both_modes() {
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["http://localhost:5173".to_string(), "not a header\n".to_string()]);
    }
}
