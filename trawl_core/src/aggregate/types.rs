//! Core types for aggregation results.

use crate::error::SourceError;
use crate::link::Link;
use crate::RawHit;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message recorded for a source that ran cleanly but found nothing.
pub const NO_RESULTS_MESSAGE: &str = "Got no results";

/// Why a source did not contribute links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Transport, credential or parse failure.
    Error,
    /// The source exceeded its time budget.
    Timeout,
    /// The source ran without error and returned an empty set.
    NoResults,
}

impl FailureKind {
    pub fn is_hard(self) -> bool {
        !matches!(self, FailureKind::NoResults)
    }
}

/// Error from a specific source, kept as data in the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    /// Source name
    pub source: String,
    /// Human-readable error description
    pub error: String,
    pub kind: FailureKind,
}

impl SourceFailure {
    pub fn new(source: impl Into<String>, error: impl Into<String>, kind: FailureKind) -> Self {
        Self {
            source: source.into(),
            error: error.into(),
            kind,
        }
    }

    /// Hard failure from an adapter error; timeouts keep their own kind.
    pub fn from_error(source: impl Into<String>, error: &SourceError) -> Self {
        let kind = if error.is_timeout() {
            FailureKind::Timeout
        } else {
            FailureKind::Error
        };
        Self::new(source, error.to_string(), kind)
    }

    pub fn timeout(source: impl Into<String>, timeout_ms: u64) -> Self {
        Self::new(
            source,
            format!("timeout after {}ms", timeout_ms),
            FailureKind::Timeout,
        )
    }

    pub fn no_results(source: impl Into<String>) -> Self {
        Self::new(source, NO_RESULTS_MESSAGE, FailureKind::NoResults)
    }

    pub fn is_hard(&self) -> bool {
        self.kind.is_hard()
    }
}

impl fmt::Display for SourceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.source, self.error)
    }
}

/// Outcome of one source invocation: either its raw hits or a tagged failure.
#[derive(Debug, Clone)]
pub enum SourceOutcome {
    Found {
        source: String,
        hits: Vec<RawHit>,
        duration_ms: u64,
    },
    Failed(SourceFailure),
}

impl SourceOutcome {
    pub fn source(&self) -> &str {
        match self {
            SourceOutcome::Found { source, .. } => source,
            SourceOutcome::Failed(failure) => &failure.source,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, SourceOutcome::Failed(_))
    }
}

/// Counts and score statistics over one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub unique: usize,
    pub reliable: usize,
    pub documents: usize,
    pub median_junk_score: f64,
    pub average_junk_score: f64,
}

/// Result envelope of one aggregation run.
#[derive(Debug, Clone, Serialize)]
pub struct AggregationRun {
    /// The username as queried.
    pub username: String,

    /// Sources that were queried (empty when served from cache).
    pub sources: Vec<String>,

    /// Every link produced, before blacklist removal and dedup.
    pub all_links: Vec<Link>,

    /// Deduplicated links, ranked by ascending junk score.
    pub unique_links: Vec<Link>,

    /// Per-source failures, hard and soft.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<SourceFailure>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// True when links came from a cache file instead of live sources.
    pub from_cache: bool,

    pub started_at: DateTime<Utc>,

    /// Wall-clock duration of the run.
    pub duration_ms: u64,
}

impl AggregationRun {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            sources: Vec::new(),
            all_links: Vec::new(),
            unique_links: Vec::new(),
            errors: Vec::new(),
            warnings: Vec::new(),
            from_cache: false,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn add_error(&mut self, failure: SourceFailure) {
        self.errors.push(failure);
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Unique links worth showing as profiles, in rank order.
    pub fn reliable_links(&self, threshold: usize) -> Vec<&Link> {
        self.unique_links
            .iter()
            .filter(|l| l.is_reliable(threshold))
            .collect()
    }

    /// Unique links that look like PDF documents, regardless of junk score.
    pub fn documents(&self) -> Vec<&Link> {
        self.unique_links.iter().filter(|l| l.is_document()).collect()
    }

    pub fn hard_failures(&self) -> Vec<&SourceFailure> {
        self.errors.iter().filter(|e| e.is_hard()).collect()
    }

    pub fn soft_failures(&self) -> Vec<&SourceFailure> {
        self.errors.iter().filter(|e| !e.is_hard()).collect()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// True when at least one source was queried and none produced links.
    pub fn all_failed(&self) -> bool {
        !self.sources.is_empty() && self.errors.len() >= self.sources.len()
    }

    pub fn summary(&self, threshold: usize) -> RunSummary {
        let mut scores: Vec<usize> = self.unique_links.iter().map(Link::junk_score).collect();
        scores.sort_unstable();

        let (median, average) = if scores.is_empty() {
            (0.0, 0.0)
        } else {
            let sum: usize = scores.iter().sum();
            (
                scores[scores.len() / 2] as f64,
                sum as f64 / scores.len() as f64,
            )
        };

        RunSummary {
            total: self.all_links.len(),
            unique: self.unique_links.len(),
            reliable: self.reliable_links(threshold).len(),
            documents: self.documents().len(),
            median_junk_score: median,
            average_junk_score: average,
        }
    }
}
