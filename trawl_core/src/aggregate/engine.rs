//! Aggregation engine.
//!
//! Queries every selected source concurrently, waits for all of them, and reduces
//! their links into an [`AggregationRun`].

use super::{
    merge_links, AggregationRun, FailureKind, RunCache, SearchSettings, SourceFailure,
    SourceOutcome,
};
use crate::error::EngineError;
use crate::link::Link;
use crate::{Source, SourceQuery, SourceRegistry};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Engine for running one username query across many sources.
pub struct Aggregator<'a> {
    registry: &'a SourceRegistry,
    cache: Option<RunCache>,
}

impl<'a> Aggregator<'a> {
    pub fn new(registry: &'a SourceRegistry) -> Self {
        Self {
            registry,
            cache: None,
        }
    }

    /// Enable debug-mode persistence: reuse cached raw links when present, and
    /// store the raw links of live runs.
    pub fn with_cache(mut self, cache: RunCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Run a query against the sources named in `settings` (all when empty).
    ///
    /// Only configuration problems fail the run; every source failure is recorded in
    /// the returned envelope.
    pub async fn run(
        &self,
        username: &str,
        settings: &SearchSettings,
    ) -> Result<AggregationRun, EngineError> {
        let sources = self.registry.resolve(&settings.sources)?;
        self.run_with_sources(username, &sources, settings).await
    }

    /// Run a query against an explicit set of source instances.
    pub async fn run_with_sources(
        &self,
        username: &str,
        sources: &[Arc<dyn Source>],
        settings: &SearchSettings,
    ) -> Result<AggregationRun, EngineError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(EngineError::EmptyUsername);
        }

        let start = Instant::now();
        let mut run = AggregationRun::new(username);

        let mut links = match self.load_cached(username, &mut run) {
            Some(links) => links,
            None => {
                run.sources = sources.iter().map(|s| s.name().to_string()).collect();
                let query = settings.query_for(username);
                let outcomes = query_sources(sources, &query, settings.source_budget_ms()).await;

                let mut links = Vec::new();
                for outcome in outcomes {
                    match outcome {
                        SourceOutcome::Found { source, hits, .. } => links.extend(
                            hits.into_iter()
                                .map(|hit| Link::new(hit.url, hit.title, username, &source)),
                        ),
                        SourceOutcome::Failed(failure) => run.add_error(failure),
                    }
                }

                self.store_cached(username, &links, &mut run);
                links
            }
        };

        run.unique_links = merge_links(&mut links, username, settings.url_filter);
        run.all_links = links;
        run.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            username = %run.username,
            total = run.all_links.len(),
            unique = run.unique_links.len(),
            errors = run.errors.len(),
            duration_ms = run.duration_ms,
            "aggregation finished"
        );

        Ok(run)
    }

    fn load_cached(&self, username: &str, run: &mut AggregationRun) -> Option<Vec<Link>> {
        let cache = self.cache.as_ref()?;
        match cache.load(username) {
            Ok(Some(links)) => {
                let path = cache.path_for(username);
                warn!(path = %path.display(), "serving links from cache file");
                run.from_cache = true;
                run.add_warning(format!("Links were loaded from file {}!", path.display()));
                Some(links)
            }
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable cache file");
                run.add_warning(format!("Cache file ignored: {}", e));
                None
            }
        }
    }

    fn store_cached(&self, username: &str, links: &[Link], run: &mut AggregationRun) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        match cache.store(username, links) {
            Ok(path) => debug!(path = %path.display(), count = links.len(), "raw links cached"),
            Err(e) => {
                warn!(error = %e, "could not write cache file");
                run.add_warning(format!("Could not write cache file: {}", e));
            }
        }
    }
}

/// Query all sources concurrently and collect one outcome per source, in input order.
///
/// Each source is bounded by `timeout_ms`. Errors, panics and timeouts become hard
/// failures; an empty result set becomes a "no results" soft failure.
pub async fn query_sources(
    sources: &[Arc<dyn Source>],
    query: &SourceQuery,
    timeout_ms: u64,
) -> Vec<SourceOutcome> {
    let futures: Vec<_> = sources
        .iter()
        .map(|source| {
            let source = Arc::clone(source);
            async move {
                let name = source.name().to_string();
                let start = Instant::now();
                debug!(source = %name, "querying source");

                let guarded = AssertUnwindSafe(source.search(query)).catch_unwind();
                let outcome = match timeout(Duration::from_millis(timeout_ms), guarded).await {
                    Ok(Ok(Ok(hits))) if hits.is_empty() => {
                        SourceOutcome::Failed(SourceFailure::no_results(&name))
                    }
                    Ok(Ok(Ok(hits))) => SourceOutcome::Found {
                        source: name.clone(),
                        hits,
                        duration_ms: start.elapsed().as_millis() as u64,
                    },
                    Ok(Ok(Err(e))) => SourceOutcome::Failed(SourceFailure::from_error(&name, &e)),
                    Ok(Err(payload)) => SourceOutcome::Failed(SourceFailure::new(
                        &name,
                        format!("source panicked: {}", panic_message(payload.as_ref())),
                        FailureKind::Error,
                    )),
                    Err(_) => SourceOutcome::Failed(SourceFailure::timeout(&name, timeout_ms)),
                };

                match &outcome {
                    SourceOutcome::Found { hits, duration_ms, .. } => {
                        debug!(source = %name, hits = hits.len(), duration_ms, "source finished")
                    }
                    SourceOutcome::Failed(f) if f.is_hard() => {
                        warn!(source = %name, error = %f.error, "source failed")
                    }
                    SourceOutcome::Failed(_) => debug!(source = %name, "source returned no results"),
                }
                outcome
            }
        })
        .collect();

    futures::future::join_all(futures).await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::RawHit;
    use async_trait::async_trait;

    struct Fixed(&'static str, Vec<RawHit>);

    #[async_trait]
    impl Source for Fixed {
        fn name(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "fixed hits"
        }
        async fn search(&self, _query: &SourceQuery) -> Result<Vec<RawHit>, SourceError> {
            Ok(self.1.clone())
        }
    }

    struct Failing;

    #[async_trait]
    impl Source for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }
        fn description(&self) -> &'static str {
            "always fails"
        }
        async fn search(&self, _query: &SourceQuery) -> Result<Vec<RawHit>, SourceError> {
            Err(SourceError::Blocked("captcha".into()))
        }
    }

    #[tokio::test]
    async fn test_outcomes_keep_input_order() {
        let sources: Vec<Arc<dyn Source>> = vec![
            Arc::new(Failing),
            Arc::new(Fixed("empty", Vec::new())),
            Arc::new(Fixed("one", vec![RawHit::new("https://a.com/john", "A")])),
        ];
        let outcomes = query_sources(&sources, &SourceQuery::new("john"), 1000).await;

        let names: Vec<_> = outcomes.iter().map(|o| o.source()).collect();
        assert_eq!(names, vec!["failing", "empty", "one"]);
        match &outcomes[0] {
            SourceOutcome::Failed(f) => assert_eq!(f.kind, FailureKind::Error),
            other => panic!("unexpected outcome: {other:?}"),
        }
        match &outcomes[1] {
            SourceOutcome::Failed(f) => assert_eq!(f.kind, FailureKind::NoResults),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(!outcomes[2].is_failure());
    }

    #[tokio::test]
    async fn test_empty_username_is_rejected() {
        let registry = SourceRegistry::new();
        let err = Aggregator::new(&registry)
            .run_with_sources("   ", &[], &SearchSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptyUsername));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(boxed.as_ref()), "boom");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(boxed.as_ref()), "bang");
        let boxed: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }
}
