//! Error types for the Scuttlebutt research core.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering search, analysis, output parsing, orchestration, finance lookups,
//! and configuration.

use std::fmt;
use std::path::PathBuf;

/// Top-level error type for the Scuttlebutt core library.
#[derive(Debug, thiserror::Error)]
pub enum ScuttlebuttError {
    #[error("Research error: {0}")]
    Research(#[from] ResearchError),

    #[error("Finance error: {0}")]
    Finance(#[from] FinanceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the web-search provider.
///
/// These never leave the search client: a failed query is logged and treated
/// as an empty result set.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("Search request failed: {message}")]
    Request { message: String },

    #[error("Search provider returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Search provider rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Search response parse error: {message}")]
    ResponseParse { message: String },
}

/// Errors from the hosted LLM completion service.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error("API request failed: {message}")]
    ApiRequest { message: String },

    #[error("API response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Provider connection failed: {message}")]
    Connection { message: String },
}

/// Errors from turning raw model output into validated ratings.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Could not parse valid JSON with a ratings array from analysis output: {prefix}")]
    MalformedAnalysisOutput { prefix: String },

    #[error("Invalid rating{}: missing field \"{field}\"", criterion_suffix(.criterion_id))]
    MissingRatingField {
        field: String,
        criterion_id: Option<i64>,
    },

    #[error("Invalid rating{}: field \"{field}\" {reason}", criterion_suffix(.criterion_id))]
    InvalidRatingField {
        field: String,
        criterion_id: Option<i64>,
        reason: String,
    },

    #[error("Rating for criterion {criterion_id}: {field} = {value} is outside {min}..={max}")]
    RatingOutOfRange {
        criterion_id: i64,
        field: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("Criterion {criterion_id} was rated more than once")]
    DuplicateCriterion { criterion_id: i64 },
}

fn criterion_suffix(criterion_id: &Option<i64>) -> String {
    criterion_id
        .map(|id| format!(" for criterion {id}"))
        .unwrap_or_default()
}

/// Pipeline stage names used when wrapping a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResearchStage {
    Aggregation,
    Analysis,
    Parsing,
}

impl fmt::Display for ResearchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResearchStage::Aggregation => "aggregation",
            ResearchStage::Analysis => "analysis",
            ResearchStage::Parsing => "parsing",
        };
        f.write_str(name)
    }
}

/// The underlying cause carried by [`ResearchError::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("{message}")]
    Other { message: String },
}

/// The single error surfaced by the research orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ResearchError {
    #[error("Scuttlebutt research failed during {stage}: {source}")]
    Failed {
        stage: ResearchStage,
        #[source]
        source: StageError,
    },

    #[error("Scuttlebutt research timed out after {timeout_secs}s")]
    TimedOut { timeout_secs: u64 },
}

impl ResearchError {
    /// Wrap a stage failure.
    pub fn failed(stage: ResearchStage, source: impl Into<StageError>) -> Self {
        ResearchError::Failed {
            stage,
            source: source.into(),
        }
    }

    /// The stage that failed, if the error came from a stage.
    pub fn stage(&self) -> Option<ResearchStage> {
        match self {
            ResearchError::Failed { stage, .. } => Some(*stage),
            ResearchError::TimedOut { .. } => None,
        }
    }
}

/// Errors from the return-on-equity lookups.
#[derive(Debug, thiserror::Error)]
pub enum FinanceError {
    #[error("CIK not found for symbol {symbol}")]
    CikNotFound { symbol: String },

    #[error("Insufficient data to compute ROE for {symbol}: {message}")]
    InsufficientData { symbol: String, message: String },

    #[error("Filing request failed: {message}")]
    Request { message: String },

    #[error("Filing service rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Filing service error ({status}): {body}")]
    Server { status: u16, body: String },

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Filing response parse error: {message}")]
    ResponseParse { message: String },

    #[error("Failed to read CIK mapping {path}: {message}")]
    Mapping { path: PathBuf, message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Environment variable not set: {var}")]
    EnvVarMissing { var: String },

    #[error("Failed to build HTTP client: {message}")]
    HttpClient { message: String },
}

/// A type alias for results using the top-level `ScuttlebuttError`.
pub type Result<T> = std::result::Result<T, ScuttlebuttError>;
