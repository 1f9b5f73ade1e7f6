//! Core data types: stakeholder signals, criterion ratings, and research results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// One of the six stakeholder groups canvassed during research.
///
/// Declaration order is the canonical order for aggregation, prompts, and output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StakeholderBucket {
    Customers,
    Employees,
    Competitors,
    Suppliers,
    Innovation,
    Risks,
}

impl StakeholderBucket {
    /// All buckets in declaration order.
    pub const ALL: [StakeholderBucket; 6] = [
        StakeholderBucket::Customers,
        StakeholderBucket::Employees,
        StakeholderBucket::Competitors,
        StakeholderBucket::Suppliers,
        StakeholderBucket::Innovation,
        StakeholderBucket::Risks,
    ];

    /// Lowercase wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StakeholderBucket::Customers => "customers",
            StakeholderBucket::Employees => "employees",
            StakeholderBucket::Competitors => "competitors",
            StakeholderBucket::Suppliers => "suppliers",
            StakeholderBucket::Innovation => "innovation",
            StakeholderBucket::Risks => "risks",
        }
    }

    /// Capitalized label used in prompt section headers.
    pub fn label(&self) -> &'static str {
        match self {
            StakeholderBucket::Customers => "Customers",
            StakeholderBucket::Employees => "Employees",
            StakeholderBucket::Competitors => "Competitors",
            StakeholderBucket::Suppliers => "Suppliers",
            StakeholderBucket::Innovation => "Innovation",
            StakeholderBucket::Risks => "Risks",
        }
    }
}

impl fmt::Display for StakeholderBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single normalized web signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Source URL; empty for synthesized summaries.
    pub source_url: String,
    pub snippet: String,
    pub title: String,
    pub relevance_score: f64,
    pub stakeholder_bucket: StakeholderBucket,
}

impl SignalRecord {
    /// Whether this record is a synthesized summary with no source URL.
    pub fn is_summary(&self) -> bool {
        self.source_url.is_empty()
    }

    /// Copy of this record tagged with a different bucket.
    pub fn tagged(self, bucket: StakeholderBucket) -> Self {
        Self {
            stakeholder_bucket: bucket,
            ..self
        }
    }
}

/// Aggregated signals keyed by stakeholder bucket.
///
/// Always holds every bucket; a bucket with no results maps to an empty list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StakeholderSignalSet {
    buckets: BTreeMap<StakeholderBucket, Vec<SignalRecord>>,
}

impl StakeholderSignalSet {
    /// Build a set from per-bucket record lists; missing buckets become empty.
    pub fn from_buckets(
        buckets: impl IntoIterator<Item = (StakeholderBucket, Vec<SignalRecord>)>,
    ) -> Self {
        let mut map: BTreeMap<StakeholderBucket, Vec<SignalRecord>> = StakeholderBucket::ALL
            .iter()
            .map(|b| (*b, Vec::new()))
            .collect();
        map.extend(buckets);
        Self { buckets: map }
    }

    /// Records for one bucket in aggregation order.
    pub fn get(&self, bucket: StakeholderBucket) -> &[SignalRecord] {
        self.buckets.get(&bucket).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Iterate buckets in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (StakeholderBucket, &[SignalRecord])> {
        self.buckets.iter().map(|(b, records)| (*b, records.as_slice()))
    }

    /// Total number of records across all buckets.
    pub fn total_records(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Distinct non-empty source URLs in bucket/aggregation order.
    pub fn source_urls(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.iter()
            .flat_map(|(_, records)| records.iter())
            .filter(|r| !r.is_summary())
            .map(|r| r.source_url.as_str())
            .filter(|url| seen.insert(*url))
            .collect()
    }
}

impl Default for StakeholderSignalSet {
    fn default() -> Self {
        Self::from_buckets(std::iter::empty())
    }
}

/// Confidence the model reports for a rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Parse case-insensitively, ignoring surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Confidence::High),
            "medium" => Some(Confidence::Medium),
            "low" => Some(Confidence::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
        };
        f.write_str(s)
    }
}

/// A model-produced rating for one Fisher criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CriterionRating {
    #[serde(alias = "criterion_id")]
    pub criterion_id: i64,
    pub rating: i64,
    pub justification: String,
    #[serde(alias = "key_findings")]
    pub key_findings: Vec<String>,
    pub sources: Vec<String>,
    pub confidence: Confidence,
}

/// The assembled output of one research run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchResult {
    pub symbol: String,
    pub company_name: String,
    pub ratings: Vec<CriterionRating>,
    #[serde(rename = "researchDate")]
    pub research_timestamp: DateTime<Utc>,
    #[serde(rename = "modelUsed")]
    pub model_identifier: String,
}

impl ResearchResult {
    /// Ratings whose criterion id is in `requested`, in original order.
    ///
    /// An empty request keeps every rating.
    pub fn filtered_ratings(&self, requested: &[i64]) -> Vec<CriterionRating> {
        filter_ratings(&self.ratings, requested)
    }

    /// Mean rating across all ratings, or `None` when there are none.
    pub fn average_rating(&self) -> Option<f64> {
        if self.ratings.is_empty() {
            return None;
        }
        let sum: i64 = self.ratings.iter().map(|r| r.rating).sum();
        Some(sum as f64 / self.ratings.len() as f64)
    }
}

/// Keep ratings whose `criterion_id` is in `requested`, preserving order.
///
/// An empty `requested` slice returns every rating unchanged.
pub fn filter_ratings(ratings: &[CriterionRating], requested: &[i64]) -> Vec<CriterionRating> {
    if requested.is_empty() {
        return ratings.to_vec();
    }
    ratings
        .iter()
        .filter(|r| requested.contains(&r.criterion_id))
        .cloned()
        .collect()
}
