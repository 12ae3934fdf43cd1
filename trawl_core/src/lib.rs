// src/lib.rs
pub mod aggregate;
pub mod error;
pub mod link;
pub mod sources;

use crate::error::{EngineError, SourceError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

pub use crate::aggregate::{
    Aggregator, AggregationRun, FailureKind, RunCache, RunSummary, SearchSettings,
    SettingsStore, SourceFailure, SourceOutcome,
};
pub use crate::link::Link;

/// Parameters handed to every source for one username query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceQuery {
    /// The username exactly as the user typed it.
    pub username: String,
    /// Hint for how many results to request; sources may return fewer.
    pub limit: u32,
    /// Interface language code, e.g. "en".
    pub language: String,
    /// Proxy URL (`http://`, `https://` or `socks5://`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,
    /// Per-request transport timeout.
    pub timeout: Duration,
}

impl SourceQuery {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            limit: aggregate::DEFAULT_RESULTS_COUNT,
            language: aggregate::DEFAULT_LANGUAGE.to_string(),
            proxy: None,
            timeout: Duration::from_millis(aggregate::DEFAULT_TIMEOUT_MS),
        }
    }
}

/// A raw `(url, title)` pair as returned by a search provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawHit {
    pub url: String,
    pub title: String,
}

impl RawHit {
    pub fn new(url: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: title.into(),
        }
    }
}

#[async_trait]
pub trait Source: Send + Sync {
    /// Returns the unique registry name of the source (e.g. "google").
    fn name(&self) -> &'static str;

    /// Returns a description of the source.
    fn description(&self) -> &'static str;

    /// Query the provider for `query.username`.
    ///
    /// Transport sessions live only for the duration of this call. An empty `Ok`
    /// is reported by the orchestrator as a "no results" soft failure.
    async fn search(&self, query: &SourceQuery) -> Result<Vec<RawHit>, SourceError>;
}

/// Builds a fresh source instance for a run.
pub type SourceFactory = Arc<dyn Fn() -> Arc<dyn Source> + Send + Sync>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    pub name: String,
    pub description: String,
}

/// Name-to-factory map of every source a run may select.
#[derive(Clone, Default)]
pub struct SourceRegistry {
    factories: BTreeMap<String, SourceFactory>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Registry with every source enabled via Cargo features.
    pub fn builtin() -> Self {
        #[allow(unused_mut)]
        let mut registry = Self::new();

        #[cfg(feature = "google")]
        registry.register("google", || {
            Arc::new(sources::google::GoogleSource::new()) as Arc<dyn Source>
        });

        #[cfg(feature = "duckduckgo")]
        registry.register("duckduckgo", || {
            Arc::new(sources::duckduckgo::DuckDuckGoSource::new()) as Arc<dyn Source>
        });

        #[cfg(feature = "bing")]
        registry.register("bing", || {
            Arc::new(sources::bing::BingSource::new()) as Arc<dyn Source>
        });

        #[cfg(feature = "naver")]
        registry.register("naver", || {
            Arc::new(sources::serpapi::SerpApiSource::naver()) as Arc<dyn Source>
        });

        #[cfg(feature = "baidu")]
        registry.register("baidu", || {
            Arc::new(sources::serpapi::SerpApiSource::baidu()) as Arc<dyn Source>
        });

        registry
    }

    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn() -> Arc<dyn Source> + Send + Sync + 'static,
    {
        self.factories
            .insert(name.into().to_lowercase(), Arc::new(factory));
    }

    /// Register an already-built source under its own name.
    pub fn register_source(&mut self, source: Arc<dyn Source>) {
        let name = source.name();
        self.register(name, move || Arc::clone(&source));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(&name.to_lowercase())
    }

    /// Registered source names, sorted.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    pub fn list_sources(&self) -> Vec<SourceInfo> {
        self.factories
            .iter()
            .map(|(name, factory)| SourceInfo {
                name: name.clone(),
                description: factory().description().to_string(),
            })
            .collect()
    }

    /// Instantiate the selected sources; an empty selection means every source.
    ///
    /// Fails on the first unknown name, before anything is queried.
    pub fn resolve(&self, selected: &[String]) -> Result<Vec<Arc<dyn Source>>, EngineError> {
        if selected.is_empty() {
            if self.factories.is_empty() {
                return Err(EngineError::NoSources);
            }
            return Ok(self.factories.values().map(|f| f()).collect());
        }

        let mut resolved: Vec<Arc<dyn Source>> = Vec::with_capacity(selected.len());
        let mut seen: Vec<String> = Vec::new();
        for name in selected {
            let key = name.trim().to_lowercase();
            if key.is_empty() || seen.contains(&key) {
                continue;
            }
            let factory = self
                .factories
                .get(&key)
                .ok_or_else(|| EngineError::UnknownSource {
                    name: name.trim().to_string(),
                    available: self.names().join(", "),
                })?;
            resolved.push(factory());
            seen.push(key);
        }

        if resolved.is_empty() {
            return Err(EngineError::NoSources);
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    #[async_trait]
    impl Source for Named {
        fn name(&self) -> &'static str {
            self.0
        }
        fn description(&self) -> &'static str {
            "test source"
        }
        async fn search(&self, _query: &SourceQuery) -> Result<Vec<RawHit>, SourceError> {
            Ok(Vec::new())
        }
    }

    fn registry() -> SourceRegistry {
        let mut registry = SourceRegistry::new();
        registry.register_source(Arc::new(Named("alpha")));
        registry.register_source(Arc::new(Named("beta")));
        registry
    }

    #[test]
    fn test_resolve_all_when_empty_selection() {
        let sources = registry().resolve(&[]).unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["alpha", "beta"]);
    }

    #[test]
    fn test_resolve_selected_is_case_insensitive_and_deduplicated() {
        let selected = vec!["Beta".to_string(), " beta ".to_string()];
        let sources = registry().resolve(&selected).unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].name(), "beta");
    }

    #[test]
    fn test_unknown_source_fails_before_running() {
        let selected = vec!["alpha".to_string(), "gamma".to_string()];
        match registry().resolve(&selected) {
            Err(EngineError::UnknownSource { name, available }) => {
                assert_eq!(name, "gamma");
                assert_eq!(available, "alpha, beta");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected unknown source error"),
        }
    }

    #[test]
    fn test_empty_registry_has_no_sources() {
        assert!(matches!(
            SourceRegistry::new().resolve(&[]),
            Err(EngineError::NoSources)
        ));
    }

    #[test]
    fn test_list_sources() {
        let infos = registry().list_sources();
        assert_eq!(infos.len(), 2);
        assert_eq!(infos[0].name, "alpha");
        assert_eq!(infos[0].description, "test source");
    }
}
