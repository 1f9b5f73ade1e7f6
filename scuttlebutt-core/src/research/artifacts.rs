//! Optional on-disk record of a research run.

use crate::types::{ResearchResult, StakeholderSignalSet};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, warn};

/// The signals document written before analysis.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalsArtifact<'a> {
    pub company_name: &'a str,
    pub ticker: Option<&'a str>,
    pub signals: &'a StakeholderSignalSet,
}

/// File-name-safe form of a ticker or company name.
pub fn safe_name(name: &str) -> String {
    name.trim().replace([' ', '/', '\\'], "_")
}

/// Writes run artifacts as pretty JSON into one directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path for the signals document of `key`.
    pub fn signals_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("scuttlebutt_signals_{}.json", safe_name(key)))
    }

    /// Path for the final result of `key`.
    pub fn result_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("scuttlebutt_{}.json", safe_name(key)))
    }

    /// Write the signals document; failures are logged, never returned.
    pub async fn write_signals(&self, key: &str, artifact: &SignalsArtifact<'_>) {
        self.write_json(self.signals_path(key), artifact).await;
    }

    /// Write the final result; failures are logged, never returned.
    pub async fn write_result(&self, key: &str, result: &ResearchResult) {
        self.write_json(self.result_path(key), result).await;
    }

    async fn write_json<T: Serialize>(&self, path: PathBuf, value: &T) {
        let body = match serde_json::to_string_pretty(value) {
            Ok(body) => body,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to serialize artifact");
                return;
            }
        };
        if let Err(e) = tokio::fs::create_dir_all(&self.dir).await {
            warn!(dir = %self.dir.display(), error = %e, "Failed to create artifact directory");
            return;
        }
        match tokio::fs::write(&path, body).await {
            Ok(()) => debug!(path = %path.display(), "Artifact written"),
            Err(e) => warn!(path = %path.display(), error = %e, "Failed to write artifact"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("Acme Corp"), "Acme_Corp");
        assert_eq!(safe_name("BRK/B"), "BRK_B");
    }

    #[tokio::test]
    async fn test_writes_both_files() {
        let dir = tempfile::tempdir().unwrap();
        let writer = ArtifactWriter::new(dir.path().join("runs"));
        let signals = StakeholderSignalSet::default();
        writer
            .write_signals(
                "Acme Corp",
                &SignalsArtifact {
                    company_name: "Acme Corp",
                    ticker: None,
                    signals: &signals,
                },
            )
            .await;
        writer
            .write_result(
                "Acme Corp",
                &ResearchResult {
                    symbol: "Acme Corp".into(),
                    company_name: "Acme Corp".into(),
                    ratings: vec![],
                    research_timestamp: Utc::now(),
                    model_identifier: "mock-model".into(),
                },
            )
            .await;

        let signals_json = std::fs::read_to_string(writer.signals_path("Acme Corp")).unwrap();
        assert!(signals_json.contains("\"companyName\": \"Acme Corp\""));
        assert!(signals_json.contains("\"customers\": []"));
        let result_json =
            std::fs::read_to_string(dir.path().join("runs/scuttlebutt_Acme_Corp.json")).unwrap();
        assert!(result_json.contains("\"modelUsed\": \"mock-model\""));
    }

    #[tokio::test]
    async fn test_unwritable_dir_is_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        let writer = ArtifactWriter::new(blocker.join("nested"));
        writer
            .write_signals(
                "X",
                &SignalsArtifact {
                    company_name: "X",
                    ticker: Some("X"),
                    signals: &StakeholderSignalSet::default(),
                },
            )
            .await;
        assert!(!writer.signals_path("X").exists());
    }
}
