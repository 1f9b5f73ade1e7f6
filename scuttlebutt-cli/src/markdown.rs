//! Markdown rendering of a research result.

use scuttlebutt_core::ResearchResult;
use scuttlebutt_core::criteria::{MAX_RATING, criterion, rating_label};
use std::fmt::Write;

/// Render a full report: header, overall average, then one section per rating.
pub fn render_report(result: &ResearchResult) -> String {
    let mut out = String::new();

    if result.symbol == result.company_name {
        let _ = writeln!(out, "# Scuttlebutt Report: {}", result.company_name);
    } else {
        let _ = writeln!(
            out,
            "# Scuttlebutt Report: {} ({})",
            result.company_name, result.symbol
        );
    }
    let _ = writeln!(
        out,
        "\n_Researched {} with `{}`_\n",
        result.research_timestamp.format("%Y-%m-%d %H:%M UTC"),
        result.model_identifier
    );

    match result.average_rating() {
        Some(avg) => {
            let _ = writeln!(
                out,
                "**Overall rating:** {avg:.1} / {MAX_RATING} ({})",
                rating_label(avg)
            );
        }
        None => out.push_str("**Overall rating:** no ratings returned\n"),
    }

    for rating in &result.ratings {
        let title = criterion(rating.criterion_id)
            .map(|c| c.title.to_string())
            .unwrap_or_else(|| format!("Criterion {}", rating.criterion_id));
        let _ = writeln!(out, "\n## {}. {}\n", rating.criterion_id, title);
        let _ = writeln!(
            out,
            "**Rating:** {}/{MAX_RATING} ({}) | **Confidence:** {}\n",
            rating.rating,
            rating_label(rating.rating as f64),
            rating.confidence
        );
        out.push_str(rating.justification.trim());
        out.push('\n');

        if !rating.key_findings.is_empty() {
            out.push_str("\n**Key findings**\n\n");
            for finding in &rating.key_findings {
                let _ = writeln!(out, "- {finding}");
            }
        }
        if !rating.sources.is_empty() {
            out.push_str("\n**Sources**\n\n");
            for source in &rating.sources {
                let _ = writeln!(out, "- <{source}>");
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;
    use scuttlebutt_core::{Confidence, CriterionRating};

    fn rating(id: i64, value: i64) -> CriterionRating {
        CriterionRating {
            criterion_id: id,
            rating: value,
            justification: "Because.".into(),
            key_findings: vec!["Strong brand".into()],
            sources: vec!["https://a.example".into()],
            confidence: Confidence::High,
        }
    }

    fn result(ratings: Vec<CriterionRating>) -> ResearchResult {
        ResearchResult {
            symbol: "ACME".into(),
            company_name: "Acme Corp".into(),
            ratings,
            research_timestamp: Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap(),
            model_identifier: "mock-model".into(),
        }
    }

    #[test]
    fn test_header_and_average() {
        let md = render_report(&result(vec![rating(1, 4), rating(2, 3)]));
        let lines: Vec<&str> = md.lines().collect();
        assert_eq!(lines[0], "# Scuttlebutt Report: Acme Corp (ACME)");
        assert!(md.contains("_Researched 2024-05-01 12:30 UTC with `mock-model`_"));
        assert!(md.contains("**Overall rating:** 3.5 / 5 (Average)"));
    }

    #[test]
    fn test_sections_use_criterion_titles() {
        let md = render_report(&result(vec![rating(1, 5)]));
        assert!(md.contains("## 1. Products/Services with Market Potential"));
        assert!(md.contains("**Rating:** 5/5 (Excellent) | **Confidence:** high"));
        assert!(md.contains("- Strong brand"));
        assert!(md.contains("- <https://a.example>"));
    }

    #[test]
    fn test_unknown_criterion_and_empty_lists() {
        let mut r = rating(42, 1);
        r.key_findings.clear();
        r.sources.clear();
        let md = render_report(&result(vec![r]));
        assert!(md.contains("## 42. Criterion 42"));
        assert!(!md.contains("**Key findings**"));
        assert!(!md.contains("**Sources**"));
    }

    #[test]
    fn test_no_ratings() {
        let mut res = result(vec![]);
        res.symbol = res.company_name.clone();
        let md = render_report(&res);
        assert!(md.starts_with("# Scuttlebutt Report: Acme Corp\n"));
        assert!(md.contains("no ratings returned"));
    }
}
