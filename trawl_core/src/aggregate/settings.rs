//! Persistent run settings.

use crate::error::EngineError;
use crate::SourceQuery;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default number of results requested from each source.
pub const DEFAULT_RESULTS_COUNT: u32 = 100;

/// Default interface language.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Default per-source timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 15000;

/// Smallest per-request timeout a run will use.
pub const MIN_TIMEOUT_MS: u64 = 100;

/// Default junk-score threshold for reliable links.
pub const DEFAULT_THRESHOLD: usize = 300;

/// Defaults applied to every run unless overridden on the command line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_results_count")]
    pub results_count: u32,

    #[serde(default = "default_language")]
    pub language: String,

    /// Flag links whose URL does not contain the username.
    #[serde(default = "default_true")]
    pub url_filter: bool,

    #[serde(default = "default_threshold")]
    pub threshold: usize,

    /// Time budget for each source.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy: Option<String>,

    /// Sources to query; empty means every registered source.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,

    /// Directory holding debug cache files (current directory when unset).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_dir: Option<PathBuf>,
}

fn default_results_count() -> u32 {
    DEFAULT_RESULTS_COUNT
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> usize {
    DEFAULT_THRESHOLD
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            results_count: DEFAULT_RESULTS_COUNT,
            language: default_language(),
            url_filter: true,
            threshold: DEFAULT_THRESHOLD,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            proxy: None,
            sources: Vec::new(),
            cache_dir: None,
        }
    }
}

impl SearchSettings {
    /// Per-request timeout, never below [`MIN_TIMEOUT_MS`].
    pub fn request_timeout_ms(&self) -> u64 {
        self.timeout_ms.max(MIN_TIMEOUT_MS)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms())
    }

    /// Wall-clock budget for one source, covering its search request and any
    /// follow-up requests.
    pub fn source_budget_ms(&self) -> u64 {
        self.request_timeout_ms().saturating_mul(2)
    }

    /// Query handed to each source for `username`.
    pub fn query_for(&self, username: &str) -> SourceQuery {
        SourceQuery {
            username: username.to_string(),
            limit: self.results_count,
            language: self.language.clone(),
            proxy: self.proxy.clone().filter(|p| !p.trim().is_empty()),
            timeout: self.timeout(),
        }
    }
}

/// YAML settings file at `~/.config/trawl/settings.yaml`.
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Create a settings store at the default location.
    pub fn new_default() -> Self {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|p| p.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            path: base.join("trawl").join("settings.yaml"),
        }
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load settings, falling back to defaults when the file is missing.
    pub fn load(&self) -> Result<SearchSettings, EngineError> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(SearchSettings::default()),
            Ok(content) => serde_yaml::from_str(&content).map_err(|e| {
                EngineError::Settings(format!("{}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SearchSettings::default()),
            Err(e) => Err(EngineError::Settings(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    pub fn save(&self, settings: &SearchSettings) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| EngineError::Settings(format!("{}: {}", parent.display(), e)))?;
        }
        let content =
            serde_yaml::to_string(settings).map_err(|e| EngineError::Settings(e.to_string()))?;
        std::fs::write(&self.path, content)
            .map_err(|e| EngineError::Settings(format!("{}: {}", self.path.display(), e)))
    }
}

impl Default for SettingsStore {
    fn default() -> Self {
        Self::new_default()
    }
}
