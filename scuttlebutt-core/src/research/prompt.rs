//! Prompt construction for the Fisher analysis.

use crate::criteria::FISHER_CRITERIA;
use crate::types::StakeholderSignalSet;
use std::collections::HashSet;
use std::fmt::Write;

/// Bumped whenever the system prompt text changes.
pub const PROMPT_VERSION: &str = "fisher-scuttlebutt/v1";

const MAX_SNIPPETS_PER_BUCKET: usize = 10;
const MAX_SOURCES_PER_BUCKET: usize = 5;

/// A system/user prompt pair ready for the analysis client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

/// Build both prompts for one company.
pub fn build_prompts(
    company_name: &str,
    ticker: Option<&str>,
    signals: &StakeholderSignalSet,
) -> PromptPair {
    PromptPair {
        system: system_prompt(),
        user: user_prompt(company_name, ticker, signals),
    }
}

/// The fixed rubric prompt listing all fifteen criteria and the output schema.
pub fn system_prompt() -> String {
    let mut prompt = String::from(
        "You are an equity analyst applying Philip Fisher's Scuttlebutt method.\n\n\
         You will receive web-derived \"virtual scuttlebutt\" about a company from customers, \
         employees, competitors, suppliers, and industry observers.\n\n\
         Using this information only, analyze the company along these 15 dimensions (Fisher's criteria):\n\n",
    );
    for c in FISHER_CRITERIA.iter() {
        if c.id == 5 {
            let _ = writeln!(
                prompt,
                "{}. {} (qualitative assessment - no financial data provided)",
                c.id, c.title
            );
        } else {
            let _ = writeln!(prompt, "{}. {}", c.id, c.title);
        }
    }
    prompt.push_str(
        "\nFor each criterion:\n\
         - Rating: 1-5 (1=Poor, 2=Below Average, 3=Average, 4=Good, 5=Excellent)\n\
         - Justification: 2-3 sentences explaining the rating\n\
         - Key Findings: 2-4 bullet points with specific evidence from the scuttlebutt\n\
         - Sources: List of URLs or information sources\n\
         - Confidence: high/medium/low based on data availability\n\n\
         Output ONLY valid JSON matching this exact structure:\n\
         {\n  \"ratings\": [\n    {\n      \"criterionId\": 1,\n      \"rating\": 4,\n      \
         \"justification\": \"...\",\n      \"keyFindings\": [\"...\"],\n      \
         \"sources\": [\"...\"],\n      \"confidence\": \"high\"\n    }\n  ]\n}\n\n\
         Return ONLY the JSON object, no markdown, no code blocks, no explanation.",
    );
    prompt
}

/// The per-company prompt carrying the aggregated signals.
///
/// Buckets appear in declaration order; buckets with no snippets are omitted.
pub fn user_prompt(
    company_name: &str,
    ticker: Option<&str>,
    signals: &StakeholderSignalSet,
) -> String {
    let heading = match ticker.map(str::trim).filter(|t| !t.is_empty()) {
        Some(t) => format!("{} ({})", company_name, t.to_uppercase()),
        None => company_name.to_string(),
    };
    let mut lines = vec![format!("Company: {heading}"), String::new()];

    for (bucket, records) in signals.iter() {
        let snippets: Vec<&str> = records
            .iter()
            .map(|r| r.snippet.as_str())
            .filter(|s| !s.is_empty())
            .take(MAX_SNIPPETS_PER_BUCKET)
            .collect();
        if snippets.is_empty() {
            continue;
        }

        let mut seen = HashSet::new();
        let sources: Vec<&str> = records
            .iter()
            .map(|r| r.source_url.as_str())
            .filter(|u| !u.is_empty() && seen.insert(*u))
            .take(MAX_SOURCES_PER_BUCKET)
            .collect();

        lines.push(format!("{}_signals:", bucket.label()));
        lines.extend(snippets.iter().map(|s| format!("- {s}")));
        if !sources.is_empty() {
            lines.push(format!("Sources: {}", sources.join(", ")));
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{SignalRecord, StakeholderBucket};
    use pretty_assertions::assert_eq;

    fn record(bucket: StakeholderBucket, url: &str, snippet: &str) -> SignalRecord {
        SignalRecord {
            source_url: url.to_string(),
            snippet: snippet.to_string(),
            title: String::new(),
            relevance_score: 0.5,
            stakeholder_bucket: bucket,
        }
    }

    #[test]
    fn test_system_prompt_lists_all_criteria() {
        let prompt = system_prompt();
        for c in FISHER_CRITERIA.iter() {
            assert!(prompt.contains(&format!("{}. {}", c.id, c.title)));
        }
        assert!(prompt.contains("\"keyFindings\""));
        assert!(prompt.contains("Return ONLY the JSON object"));
    }

    #[test]
    fn test_user_prompt_layout() {
        let signals = StakeholderSignalSet::from_buckets([
            (
                StakeholderBucket::Customers,
                vec![
                    record(StakeholderBucket::Customers, "", "Summary of reviews"),
                    record(StakeholderBucket::Customers, "https://a", "Great product"),
                    record(StakeholderBucket::Customers, "https://a", "Repeat source"),
                ],
            ),
            (
                StakeholderBucket::Risks,
                vec![record(StakeholderBucket::Risks, "https://r", "Pending lawsuit")],
            ),
            (
                StakeholderBucket::Employees,
                vec![record(StakeholderBucket::Employees, "https://e", "")],
            ),
        ]);

        let prompt = user_prompt("Acme Corp", Some("acme"), &signals);
        let expected = "Company: Acme Corp (ACME)\n\
                        \n\
                        Customers_signals:\n\
                        - Summary of reviews\n\
                        - Great product\n\
                        - Repeat source\n\
                        Sources: https://a\n\
                        \n\
                        Risks_signals:\n\
                        - Pending lawsuit\n\
                        Sources: https://r\n";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_user_prompt_without_ticker_or_signals() {
        let prompt = user_prompt("Acme Corp", None, &StakeholderSignalSet::default());
        assert_eq!(prompt, "Company: Acme Corp\n");
    }

    #[test]
    fn test_snippet_and_source_limits() {
        let records = (0..12)
            .map(|i| record(StakeholderBucket::Innovation, &format!("https://{i}"), &format!("s{i}")))
            .collect();
        let signals = StakeholderSignalSet::from_buckets([(StakeholderBucket::Innovation, records)]);
        let prompt = user_prompt("Acme", None, &signals);
        assert_eq!(prompt.lines().filter(|l| l.starts_with("- ")).count(), 10);
        let sources = prompt.lines().find(|l| l.starts_with("Sources: ")).unwrap();
        assert_eq!(sources.split(", ").count(), 5);
    }

    #[test]
    fn test_build_is_deterministic() {
        let signals = StakeholderSignalSet::default();
        assert_eq!(
            build_prompts("Acme", None, &signals),
            build_prompts("Acme", None, &signals)
        );
    }
}
