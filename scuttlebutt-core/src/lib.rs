//! # Scuttlebutt Core
//!
//! Core library for Scuttlebutt equity research.
//! Provides stakeholder signal aggregation, LLM analysis against Philip
//! Fisher's fifteen criteria, output parsing and validation, SEC EDGAR
//! return-on-equity lookups, the HTTP gateway, configuration, and types.

pub mod analysis;
pub mod config;
pub mod criteria;
pub mod error;
pub mod finance;
pub mod gateway;
pub mod providers;
pub mod research;
pub mod search;
pub mod types;

// Re-export commonly used types at the crate root.
pub use analysis::{AnalysisClient, MockAnalysisClient};
pub use config::{ScuttlebuttConfig, ValidationPolicy, config_exists, load_config};
pub use criteria::{Criterion, FISHER_CRITERIA};
pub use error::{
    AnalysisError, FinanceError, ParseError, ResearchError, ResearchStage, Result,
    ScuttlebuttError,
};
pub use finance::{RoeProvider, RoeReport, SecEdgarClient};
pub use providers::create_analysis_client;
pub use research::ResearchOrchestrator;
pub use search::{SearchProvider, TavilyClient};
pub use types::{
    Confidence, CriterionRating, ResearchResult, SignalRecord, StakeholderBucket,
    StakeholderSignalSet,
};
