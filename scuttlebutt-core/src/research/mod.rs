//! Scuttlebutt research pipeline.
//!
//! Runs a 4-stage process for one company:
//! 1. **Aggregate**: templated web searches per stakeholder bucket
//! 2. **Prompt**: rubric system prompt plus a signals user prompt
//! 3. **Analyze**: one call to the configured LLM backend
//! 4. **Parse**: extract and validate the ratings, merge fallback sources

pub mod aggregator;
pub mod artifacts;
pub mod orchestrator;
pub mod parser;
pub mod prompt;

pub use aggregator::{SignalAggregator, bucket_queries, dedup_and_cap};
pub use artifacts::ArtifactWriter;
pub use orchestrator::ResearchOrchestrator;
pub use parser::{ResponseParser, merge_fallback_sources};
pub use prompt::{PROMPT_VERSION, PromptPair, build_prompts};
