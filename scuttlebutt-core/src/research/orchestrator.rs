//! Research orchestrator: aggregate -> prompt -> analyze -> parse.

use super::aggregator::SignalAggregator;
use super::artifacts::{ArtifactWriter, SignalsArtifact};
use super::parser::{ResponseParser, merge_fallback_sources};
use super::prompt::build_prompts;
use crate::analysis::AnalysisClient;
use crate::config::{ResearchConfig, ScuttlebuttConfig, ValidationPolicy};
use crate::error::{ConfigError, ResearchError, ResearchStage, StageError};
use crate::providers::create_analysis_client;
use crate::search::{SearchProvider, TavilyClient};
use crate::types::ResearchResult;
use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Runs the full Scuttlebutt pipeline for one company at a time.
///
/// Holds no per-run state, so one instance can serve concurrent runs.
pub struct ResearchOrchestrator {
    aggregator: SignalAggregator,
    analysis: Arc<dyn AnalysisClient>,
    parser: ResponseParser,
    timeout_secs: u64,
    default_max_results: usize,
    max_fallback_sources: usize,
    artifacts: Option<ArtifactWriter>,
}

impl ResearchOrchestrator {
    /// Assemble an orchestrator from explicit collaborators.
    pub fn new(
        search: Arc<dyn SearchProvider>,
        analysis: Arc<dyn AnalysisClient>,
        config: &ResearchConfig,
    ) -> Self {
        Self {
            aggregator: SignalAggregator::new(search, config.search_concurrency),
            analysis,
            parser: ResponseParser::new(config.validation_policy),
            timeout_secs: config.request_timeout_secs,
            default_max_results: config.max_results_per_bucket,
            max_fallback_sources: config.max_fallback_sources,
            artifacts: config
                .persist_artifacts
                .then(|| ArtifactWriter::new(config.artifact_dir.clone())),
        }
    }

    /// Build the search and analysis clients from configuration.
    ///
    /// Missing API keys surface here, once, rather than on every run.
    pub fn from_config(config: &ScuttlebuttConfig) -> Result<Self, ConfigError> {
        let search = Arc::new(TavilyClient::new(&config.search, &config.retry)?);
        let analysis = create_analysis_client(&config.llm)?;
        Ok(Self::new(search, analysis, &config.research))
    }

    /// Per-bucket cap used when a caller does not choose one.
    pub fn default_max_results(&self) -> usize {
        self.default_max_results
    }

    pub fn model_identifier(&self) -> String {
        self.analysis.model_identifier()
    }

    /// Policy applied to parsed ratings.
    pub fn validation_policy(&self) -> ValidationPolicy {
        self.parser.policy()
    }

    /// Run the whole pipeline under the configured overall timeout.
    pub async fn run(
        &self,
        company_name: &str,
        ticker: Option<&str>,
        max_results_per_bucket: usize,
    ) -> Result<ResearchResult, ResearchError> {
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            self.run_stages(company_name, ticker, max_results_per_bucket),
        )
        .await;

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    symbol = %result.symbol,
                    ratings = result.ratings.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Scuttlebutt research complete"
                );
                Ok(result)
            }
            Ok(Err(e)) => {
                warn!(company = company_name, error = %e, "Scuttlebutt research failed");
                Err(e)
            }
            Err(_) => {
                warn!(
                    company = company_name,
                    timeout_secs = self.timeout_secs,
                    "Scuttlebutt research timed out"
                );
                Err(ResearchError::TimedOut {
                    timeout_secs: self.timeout_secs,
                })
            }
        }
    }

    async fn run_stages(
        &self,
        company_name: &str,
        ticker: Option<&str>,
        max_results_per_bucket: usize,
    ) -> Result<ResearchResult, ResearchError> {
        let company_name = company_name.trim();
        if company_name.is_empty() {
            return Err(ResearchError::failed(
                ResearchStage::Aggregation,
                StageError::Other {
                    message: "company name must not be empty".to_string(),
                },
            ));
        }
        let ticker = ticker.map(str::trim).filter(|t| !t.is_empty());
        let symbol = ticker
            .map(str::to_uppercase)
            .unwrap_or_else(|| company_name.to_string());

        let signals = self
            .aggregator
            .aggregate(company_name, ticker, max_results_per_bucket)
            .await;

        if let Some(writer) = &self.artifacts {
            let artifact = SignalsArtifact {
                company_name,
                ticker,
                signals: &signals,
            };
            writer.write_signals(&symbol, &artifact).await;
        }

        let prompts = build_prompts(company_name, ticker, &signals);

        let raw = self
            .analysis
            .analyze(&prompts.system, &prompts.user)
            .await
            .map_err(|e| ResearchError::failed(ResearchStage::Analysis, e))?;

        let mut ratings = self
            .parser
            .parse(&raw)
            .map_err(|e| ResearchError::failed(ResearchStage::Parsing, e))?;
        merge_fallback_sources(&mut ratings, &signals, self.max_fallback_sources);

        let result = ResearchResult {
            symbol: symbol.clone(),
            company_name: company_name.to_string(),
            ratings,
            research_timestamp: Utc::now(),
            model_identifier: self.analysis.model_identifier(),
        };

        if let Some(writer) = &self.artifacts {
            writer.write_result(&symbol, &result).await;
        }
        Ok(result)
    }
}
