//! Username aggregation across search sources.
//!
//! This module provides:
//! - `Aggregator`: concurrent fan-out to every selected source and fan-in of outcomes
//! - `merge_links` / `rank_links`: the dedup, blacklist, filter and ranking pipeline
//! - `AggregationRun`: the result envelope handed to presentation layers
//! - `RunCache`: debug-mode persistence of raw links
//! - `SearchSettings` / `SettingsStore`: YAML-backed run defaults
//!
//! # Example
//!
//! ```ignore
//! use trawl_core::{Aggregator, SearchSettings, SourceRegistry};
//!
//! let registry = SourceRegistry::builtin();
//! let run = Aggregator::new(&registry)
//!     .run("johndoe", &SearchSettings::default())
//!     .await?;
//! for link in run.reliable_links(300) {
//!     println!("{}", link.url());
//! }
//! ```

mod cache;
mod engine;
mod merge;
mod settings;
mod types;

pub use cache::{RunCache, CACHE_FILE_PREFIX};
pub use engine::{query_sources, Aggregator};
pub use merge::{merge_links, rank_links, LINKS_BLACKLIST};
pub use settings::{
    SearchSettings, SettingsStore, DEFAULT_LANGUAGE, DEFAULT_RESULTS_COUNT, DEFAULT_THRESHOLD,
    DEFAULT_TIMEOUT_MS, MIN_TIMEOUT_MS,
};
pub use types::{AggregationRun, FailureKind, RunSummary, SourceFailure, SourceOutcome};
