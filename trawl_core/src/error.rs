// src/error.rs

/// Error raised by a single source adapter while it queries its search provider.
///
/// These never escape a run: the orchestrator converts every one of them into a
/// [`SourceFailure`](crate::aggregate::SourceFailure) tagged with the source name.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request error: {0}")]
    HttpRequest(#[from] reqwest::Error),

    #[error("Serde JSON error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Page is a CAPTCHA or the engine is unavailable: {0}")]
    Blocked(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Other error: {0}")]
    Other(String),
}

impl SourceError {
    pub fn code_str(&self) -> &'static str {
        match self {
            SourceError::HttpRequest(e) if e.is_timeout() => "timeout",
            SourceError::HttpRequest(_) => "upstream_error",
            SourceError::SerdeJson(_) => "parse_error",
            SourceError::MissingCredentials(_) => "auth_failed",
            SourceError::InvalidInput(_) => "invalid_input",
            SourceError::Parse(_) => "parse_error",
            SourceError::Blocked(_) => "blocked",
            SourceError::Timeout(_) => "timeout",
            SourceError::Other(_) => "internal_error",
        }
    }

    pub fn is_timeout(&self) -> bool {
        self.code_str() == "timeout"
    }
}

/// Errors that abort a whole run before (or instead of) querying.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Unknown source '{name}'. Available sources: {available}")]
    UnknownSource { name: String, available: String },

    #[error("No sources selected")]
    NoSources,

    #[error("Username must not be empty")]
    EmptyUsername,

    #[error("Cache I/O error for {path}: {source}")]
    CacheIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cache file {path} is malformed: {source}")]
    CacheFormat {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Settings error: {0}")]
    Settings(String),
}
