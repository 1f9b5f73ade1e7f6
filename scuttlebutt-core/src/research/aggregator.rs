//! Stakeholder signal aggregation.
//!
//! Fans the 18 templated queries (six buckets, three templates each) out over
//! a bounded, order-preserving stream, then deduplicates and caps per bucket.

use crate::search::SearchProvider;
use crate::types::{SignalRecord, StakeholderBucket, StakeholderSignalSet};
use futures::StreamExt;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// The three query templates for a bucket. `{company}` is substituted.
pub fn query_templates(bucket: StakeholderBucket) -> [&'static str; 3] {
    match bucket {
        StakeholderBucket::Customers => [
            "{company} customer reviews product quality",
            "{company} customer satisfaction service complaints",
            "{company} customer testimonials user experience",
        ],
        StakeholderBucket::Employees => [
            "{company} Glassdoor reviews management culture",
            "working at {company} employee reviews",
            "{company} employee satisfaction culture values",
        ],
        StakeholderBucket::Competitors => [
            "{company} main competitors market share",
            "{company} competitive advantages weaknesses industry analysis",
            "{company} industry position market leadership",
        ],
        StakeholderBucket::Suppliers => [
            "{company} suppliers supply chain issues partnerships",
            "{company} key suppliers vendor relationships",
            "{company} strategic partnerships alliances",
        ],
        StakeholderBucket::Innovation => [
            "{company} product roadmap innovation R&D",
            "{company} research development new products",
            "{company} patents technology innovation",
        ],
        StakeholderBucket::Risks => [
            "{company} controversies lawsuits regulatory investigations",
            "{company} legal issues regulatory compliance",
            "{company} ethical concerns corporate governance",
        ],
    }
}

/// Rendered queries for a bucket, in template order.
pub fn bucket_queries(bucket: StakeholderBucket, company_name: &str) -> Vec<String> {
    query_templates(bucket)
        .iter()
        .map(|t| t.replace("{company}", company_name))
        .collect()
}

/// Keep the first record per URL, then truncate to `cap`.
///
/// Summaries share the empty URL, so only the first one survives.
pub fn dedup_and_cap(records: Vec<SignalRecord>, cap: usize) -> Vec<SignalRecord> {
    let mut seen: HashSet<String> = HashSet::new();
    records
        .into_iter()
        .filter(|r| seen.insert(r.source_url.clone()))
        .take(cap)
        .collect()
}

/// Builds a [`StakeholderSignalSet`] for one company.
pub struct SignalAggregator {
    search: Arc<dyn SearchProvider>,
    concurrency: usize,
}

impl SignalAggregator {
    /// Create an aggregator running up to `concurrency` queries at once (min 1).
    pub fn new(search: Arc<dyn SearchProvider>, concurrency: usize) -> Self {
        Self {
            search,
            concurrency: concurrency.max(1),
        }
    }

    /// Collect, deduplicate, cap, and tag signals for every bucket.
    ///
    /// Never fails: a query that errors contributes no records, and a bucket
    /// with no records is present and empty.
    pub async fn aggregate(
        &self,
        company_name: &str,
        ticker: Option<&str>,
        max_results_per_bucket: usize,
    ) -> StakeholderSignalSet {
        info!(
            company = company_name,
            ticker = ticker.unwrap_or(""),
            max_results_per_bucket,
            concurrency = self.concurrency,
            "Aggregating stakeholder signals"
        );

        let jobs: Vec<(StakeholderBucket, String)> = StakeholderBucket::ALL
            .iter()
            .flat_map(|b| bucket_queries(*b, company_name).into_iter().map(move |q| (*b, q)))
            .collect();

        // `buffered` yields in submission order, so bucket/template order survives.
        let results: Vec<(StakeholderBucket, Vec<SignalRecord>)> = futures::stream::iter(jobs)
            .map(|(bucket, query)| {
                let search = Arc::clone(&self.search);
                async move {
                    let records = search.search(&query, max_results_per_bucket).await;
                    (bucket, records)
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut per_bucket: Vec<(StakeholderBucket, Vec<SignalRecord>)> = StakeholderBucket::ALL
            .iter()
            .map(|b| (*b, Vec::new()))
            .collect();
        for (bucket, records) in results {
            if let Some((_, acc)) = per_bucket.iter_mut().find(|(b, _)| *b == bucket) {
                acc.extend(records);
            }
        }

        let set = StakeholderSignalSet::from_buckets(per_bucket.into_iter().map(|(bucket, records)| {
            let kept: Vec<SignalRecord> = dedup_and_cap(records, max_results_per_bucket)
                .into_iter()
                .map(|r| r.tagged(bucket))
                .collect();
            debug!(bucket = %bucket, count = kept.len(), "Bucket aggregated");
            (bucket, kept)
        }));

        info!(total = set.total_records(), "Signal aggregation complete");
        set
    }
}
