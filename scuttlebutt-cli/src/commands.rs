//! CLI subcommand handlers.

use crate::markdown::render_report;
use crate::{Commands, ConfigAction, OutputFormat};
use anyhow::Context;
use scuttlebutt_core::config::workspace_config_path;
use scuttlebutt_core::gateway::{AppState, run_gateway};
use scuttlebutt_core::{
    FISHER_CRITERIA, ResearchOrchestrator, ResearchResult, RoeProvider, ScuttlebuttConfig,
    SecEdgarClient, ValidationPolicy, load_config,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Handle a CLI subcommand.
pub async fn handle_command(command: Commands, workspace: &Path) -> anyhow::Result<()> {
    match command {
        Commands::Research {
            company,
            ticker,
            max_results,
            output,
            format,
            strict,
        } => {
            let mut config = load(workspace)?;
            if strict {
                config.research.validation_policy = ValidationPolicy::Strict;
            }
            handle_research(
                &config,
                &company,
                ticker.as_deref(),
                max_results,
                output,
                format,
            )
            .await
        }
        Commands::Serve { host, port } => {
            let mut config = load(workspace)?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            handle_serve(&config).await
        }
        Commands::Roe { symbol } => handle_roe(&load(workspace)?, &symbol).await,
        Commands::Criteria => {
            print!("{}", render_criteria());
            Ok(())
        }
        Commands::Config { action } => handle_config(action, workspace),
    }
}

fn load(workspace: &Path) -> anyhow::Result<ScuttlebuttConfig> {
    let config = load_config(Some(workspace), None)
        .map_err(|e| anyhow::anyhow!("Configuration error: {}", e))?;
    for warning in config.validate() {
        warn!("{warning}");
    }
    Ok(config)
}

async fn handle_research(
    config: &ScuttlebuttConfig,
    company: &str,
    ticker: Option<&str>,
    max_results: Option<usize>,
    output: Option<PathBuf>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let orchestrator = ResearchOrchestrator::from_config(config)?;
    let max_results = max_results.unwrap_or_else(|| orchestrator.default_max_results());
    info!(
        company,
        model = %orchestrator.model_identifier(),
        policy = ?orchestrator.validation_policy(),
        max_results,
        "Starting scuttlebutt research"
    );

    let result = orchestrator.run(company, ticker, max_results).await?;
    let rendered = render(&result, format)?;

    match output {
        Some(path) => {
            std::fs::write(&path, &rendered)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}

fn render(result: &ResearchResult, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(result)?,
        OutputFormat::Markdown => render_report(result),
    })
}

async fn handle_serve(config: &ScuttlebuttConfig) -> anyhow::Result<()> {
    let research = ResearchOrchestrator::from_config(config)?;
    let roe: Arc<dyn RoeProvider> = Arc::new(SecEdgarClient::new(&config.finance, &config.retry)?);
    let state = Arc::new(AppState { research, roe });
    run_gateway(state, &config.gateway)
        .await
        .with_context(|| format!("Gateway failed on {}", config.gateway.bind_addr()))
}

async fn handle_roe(config: &ScuttlebuttConfig, symbol: &str) -> anyhow::Result<()> {
    let client = SecEdgarClient::new(&config.finance, &config.retry)?;
    let report = client.roe(symbol).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn render_criteria() -> String {
    let mut out = String::new();
    for c in &FISHER_CRITERIA {
        out.push_str(&format!("{:>2}. {}\n    {}\n", c.id, c.title, c.description));
    }
    out
}

fn handle_config(action: ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }
            let toml_str = toml::to_string_pretty(&ScuttlebuttConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace)?;
            println!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use scuttlebutt_core::{Confidence, CriterionRating};

    #[test]
    fn test_render_criteria_lists_all_fifteen() {
        let text = render_criteria();
        assert_eq!(text.lines().filter(|l| !l.starts_with("    ")).count(), 15);
        assert!(text.starts_with(" 1. Products/Services with Market Potential"));
    }

    #[test]
    fn test_render_json_uses_wire_names() {
        let result = ResearchResult {
            symbol: "ACME".into(),
            company_name: "Acme Corp".into(),
            ratings: vec![CriterionRating {
                criterion_id: 3,
                rating: 4,
                justification: "j".into(),
                key_findings: vec![],
                sources: vec![],
                confidence: Confidence::Medium,
            }],
            research_timestamp: Utc::now(),
            model_identifier: "m".into(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&render(&result, OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json["modelUsed"], "m");
        assert_eq!(json["ratings"][0]["criterionId"], 3);
        assert!(json["researchDate"].is_string());
    }

    #[test]
    fn test_config_init_writes_loadable_file() {
        let dir = tempfile::TempDir::new().unwrap();
        handle_config(ConfigAction::Init, dir.path()).unwrap();
        let path = workspace_config_path(dir.path());
        assert!(path.exists());

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[research]"));
        assert!(!text.contains("api_key ="));

        // second init leaves the file alone
        handle_config(ConfigAction::Init, dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), text);
    }
}
