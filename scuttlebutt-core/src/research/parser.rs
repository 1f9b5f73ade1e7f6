//! Turning raw model output into validated criterion ratings.
//!
//! Extraction is an ordered chain of strategies; the first one that yields a
//! JSON object with a `ratings` array wins. Validation then walks the array in
//! order and stops at the first bad element.

use crate::config::ValidationPolicy;
use crate::criteria::{FISHER_CRITERIA, MAX_RATING, MIN_RATING};
use crate::error::ParseError;
use crate::types::{Confidence, CriterionRating, StakeholderSignalSet};
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

/// Characters of raw output echoed back in `MalformedAnalysisOutput`.
pub const ERROR_PREFIX_CHARS: usize = 500;

static FENCED_BLOCK: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").ok());

type Strategy = fn(&str) -> Option<Value>;

/// Extraction strategies, tried in order.
const STRATEGIES: [(&str, Strategy); 3] = [
    ("whole_text", whole_text),
    ("fenced_block", fenced_block),
    ("embedded_object", embedded_object),
];

fn whole_text(raw: &str) -> Option<Value> {
    serde_json::from_str(raw.trim()).ok()
}

/// First fenced block, of possibly several, holding a ratings object.
fn fenced_block(raw: &str) -> Option<Value> {
    FENCED_BLOCK
        .as_ref()?
        .captures_iter(raw)
        .filter_map(|caps| serde_json::from_str::<Value>(caps.get(1)?.as_str()).ok())
        .find(has_ratings_array)
}

/// First JSON object starting at any `{` that decodes and carries ratings.
///
/// Decoding stops at the end of the object, so braces in surrounding prose
/// on either side are skipped.
fn embedded_object(raw: &str) -> Option<Value> {
    raw.match_indices('{').find_map(|(start, _)| {
        let mut stream = serde_json::Deserializer::from_str(&raw[start..]).into_iter::<Value>();
        match stream.next() {
            Some(Ok(value)) if has_ratings_array(&value) => Some(value),
            _ => None,
        }
    })
}

fn has_ratings_array(value: &Value) -> bool {
    value.get("ratings").is_some_and(Value::is_array)
}

/// Find the ratings array in raw model output.
pub fn extract_ratings(raw: &str) -> Result<Vec<Value>, ParseError> {
    for (name, strategy) in STRATEGIES {
        if let Some(Value::Object(mut obj)) = strategy(raw).filter(has_ratings_array)
            && let Some(Value::Array(ratings)) = obj.remove("ratings")
        {
            debug!(strategy = name, count = ratings.len(), "Extracted ratings");
            return Ok(ratings);
        }
    }
    Err(ParseError::MalformedAnalysisOutput {
        prefix: raw.chars().take(ERROR_PREFIX_CHARS).collect(),
    })
}

/// Parses and validates model output under a [`ValidationPolicy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseParser {
    policy: ValidationPolicy,
}

impl ResponseParser {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Extract and validate every rating, failing on the first invalid one.
    pub fn parse(&self, raw: &str) -> Result<Vec<CriterionRating>, ParseError> {
        let values = extract_ratings(raw)?;
        let mut ratings = Vec::with_capacity(values.len());
        for (index, value) in values.iter().enumerate() {
            ratings.push(validate_rating(index, value)?);
        }
        if self.policy == ValidationPolicy::Strict {
            enforce_strict(&ratings)?;
        }
        Ok(ratings)
    }
}

/// Look up a field under its camelCase or snake_case name.
fn field<'a>(obj: &'a Map<String, Value>, camel: &str, snake: &str) -> Option<&'a Value> {
    obj.get(camel).or_else(|| obj.get(snake))
}

fn as_integer(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.is_finite())
            .map(|f| f as i64)
    })
}

fn validate_rating(index: usize, value: &Value) -> Result<CriterionRating, ParseError> {
    let obj = value.as_object().ok_or_else(|| ParseError::InvalidRatingField {
        field: format!("ratings[{index}]"),
        criterion_id: None,
        reason: "must be an object".to_string(),
    })?;

    let id_hint = field(obj, "criterionId", "criterion_id").and_then(as_integer);
    let missing = |name: &str| ParseError::MissingRatingField {
        field: name.to_string(),
        criterion_id: id_hint,
    };
    let invalid = |name: &str, reason: &str| ParseError::InvalidRatingField {
        field: name.to_string(),
        criterion_id: id_hint,
        reason: reason.to_string(),
    };

    // Presence first, in declaration order, so the first missing field is reported.
    let raw_id = field(obj, "criterionId", "criterion_id").ok_or_else(|| missing("criterionId"))?;
    let raw_rating = obj.get("rating").ok_or_else(|| missing("rating"))?;
    let raw_justification = obj.get("justification").ok_or_else(|| missing("justification"))?;
    let raw_findings = field(obj, "keyFindings", "key_findings").ok_or_else(|| missing("keyFindings"))?;
    let raw_sources = obj.get("sources").ok_or_else(|| missing("sources"))?;
    let raw_confidence = obj.get("confidence").ok_or_else(|| missing("confidence"))?;

    let criterion_id =
        as_integer(raw_id).ok_or_else(|| invalid("criterionId", "must be an integer"))?;
    let rating = as_integer(raw_rating).ok_or_else(|| invalid("rating", "must be an integer"))?;
    let justification = raw_justification
        .as_str()
        .ok_or_else(|| invalid("justification", "must be a string"))?
        .to_string();

    let key_findings = raw_findings
        .as_array()
        .ok_or_else(|| invalid("keyFindings", "must be an array of strings"))?
        .iter()
        .map(|v| v.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid("keyFindings", "must be an array of strings"))?;

    // Sources may be plain URLs or objects carrying a `url`.
    let sources = raw_sources
        .as_array()
        .ok_or_else(|| invalid("sources", "must be an array"))?
        .iter()
        .map(|v| match v {
            Value::String(s) => Some(s.clone()),
            Value::Object(o) => o.get("url").and_then(Value::as_str).map(str::to_string),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| invalid("sources", "must contain URL strings"))?;

    let confidence = raw_confidence
        .as_str()
        .and_then(Confidence::parse)
        .ok_or_else(|| invalid("confidence", "must be one of high, medium, low"))?;

    Ok(CriterionRating {
        criterion_id,
        rating,
        justification,
        key_findings,
        sources,
        confidence,
    })
}

fn enforce_strict(ratings: &[CriterionRating]) -> Result<(), ParseError> {
    let max_id = FISHER_CRITERIA.len() as i64;
    let mut seen = HashSet::new();
    for r in ratings {
        if !(1..=max_id).contains(&r.criterion_id) {
            return Err(ParseError::RatingOutOfRange {
                criterion_id: r.criterion_id,
                field: "criterionId".to_string(),
                value: r.criterion_id,
                min: 1,
                max: max_id,
            });
        }
        if !(MIN_RATING..=MAX_RATING).contains(&r.rating) {
            return Err(ParseError::RatingOutOfRange {
                criterion_id: r.criterion_id,
                field: "rating".to_string(),
                value: r.rating,
                min: MIN_RATING,
                max: MAX_RATING,
            });
        }
        if !seen.insert(r.criterion_id) {
            return Err(ParseError::DuplicateCriterion {
                criterion_id: r.criterion_id,
            });
        }
    }
    Ok(())
}

/// Give every rating with no sources up to `max_sources` URLs from the signals.
///
/// URLs are distinct, non-empty, and in bucket/aggregation order. Ratings that
/// already cite sources are left untouched.
pub fn merge_fallback_sources(
    ratings: &mut [CriterionRating],
    signals: &StakeholderSignalSet,
    max_sources: usize,
) {
    let fallback: Vec<String> = signals
        .source_urls()
        .into_iter()
        .take(max_sources)
        .map(str::to_string)
        .collect();
    if fallback.is_empty() {
        return;
    }
    for rating in ratings.iter_mut().filter(|r| r.sources.is_empty()) {
        rating.sources = fallback.clone();
    }
}
