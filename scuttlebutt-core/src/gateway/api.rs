//! Request/response bodies and error mapping for the HTTP gateway.

use crate::error::{AnalysisError, FinanceError, ResearchError, StageError};
use crate::types::CriterionRating;
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Body of `POST /fisher-research`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FisherResearchRequest {
    pub symbol: String,
    pub company_name: String,
    /// Criterion ids to keep; empty or absent keeps all.
    #[serde(default)]
    pub criteria_to_research: Vec<i64>,
}

/// Response of `POST /fisher-research`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FisherResearchResponse {
    pub symbol: String,
    pub ratings: Vec<CriterionRating>,
    pub research_date: DateTime<Utc>,
    pub model_used: String,
}

/// An error rendered as `{"detail": ...}` with a status code.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

impl From<ResearchError> for ApiError {
    fn from(err: ResearchError) -> Self {
        let status = match &err {
            ResearchError::TimedOut { .. } => StatusCode::GATEWAY_TIMEOUT,
            ResearchError::Failed { source, .. } => match source {
                StageError::Analysis(AnalysisError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
                StageError::Analysis(_) => StatusCode::SERVICE_UNAVAILABLE,
                StageError::Parse(_) => StatusCode::BAD_GATEWAY,
                StageError::Other { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        };
        Self::new(status, err.to_string())
    }
}

impl From<FinanceError> for ApiError {
    fn from(err: FinanceError) -> Self {
        let status = match &err {
            FinanceError::CikNotFound { .. } => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::new(status, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ParseError, ResearchStage};

    #[test]
    fn test_request_criteria_default_empty() {
        let req: FisherResearchRequest =
            serde_json::from_str(r#"{"symbol":"AAPL","companyName":"Apple Inc."}"#).unwrap();
        assert!(req.criteria_to_research.is_empty());
        assert_eq!(req.company_name, "Apple Inc.");
    }

    #[test]
    fn test_research_error_status_classes() {
        let analysis: ApiError = ResearchError::failed(
            ResearchStage::Analysis,
            AnalysisError::Connection {
                message: "refused".into(),
            },
        )
        .into();
        assert_eq!(analysis.status, StatusCode::SERVICE_UNAVAILABLE);

        let parse: ApiError = ResearchError::failed(
            ResearchStage::Parsing,
            ParseError::MissingRatingField {
                field: "confidence".into(),
                criterion_id: Some(1),
            },
        )
        .into();
        assert_eq!(parse.status, StatusCode::BAD_GATEWAY);

        let timeout: ApiError = ResearchError::TimedOut { timeout_secs: 300 }.into();
        assert_eq!(timeout.status, StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_finance_error_status_classes() {
        let not_found: ApiError = FinanceError::CikNotFound {
            symbol: "ZZZZ".into(),
        }
        .into();
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.detail, "CIK not found for symbol ZZZZ");

        let other: ApiError = FinanceError::InsufficientData {
            symbol: "X".into(),
            message: "no values".into(),
        }
        .into();
        assert_eq!(other.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
