//! SerpApi-backed sources (Naver and Baidu).
//!
//! Credentials come from `SERPAPI_API_KEY` (or the older `SERPAPI_KEY`) unless an
//! explicit key is supplied with [`SerpApiSource::with_api_key`].

use super::{http_client, non_redirecting_client};
use crate::error::SourceError;
use crate::{RawHit, Source, SourceQuery};
use async_trait::async_trait;
use reqwest::header::LOCATION;
use reqwest::Client;
use serde::Deserialize;
use std::time::Instant;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://serpapi.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerpEngine {
    Naver,
    Baidu,
}

impl SerpEngine {
    fn name(self) -> &'static str {
        match self {
            SerpEngine::Naver => "naver",
            SerpEngine::Baidu => "baidu",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    link: Option<String>,
    title: Option<String>,
}

pub struct SerpApiSource {
    engine: SerpEngine,
    base_url: String,
    api_key: Option<String>,
}

impl SerpApiSource {
    pub fn new(engine: SerpEngine) -> Self {
        let api_key = std::env::var("SERPAPI_API_KEY")
            .or_else(|_| std::env::var("SERPAPI_KEY"))
            .ok()
            .filter(|k| !k.trim().is_empty());
        Self {
            engine,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    pub fn naver() -> Self {
        Self::new(SerpEngine::Naver)
    }

    pub fn baidu() -> Self {
        Self::new(SerpEngine::Baidu)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn params(&self, query: &SourceQuery, key: &str) -> Vec<(&'static str, String)> {
        let mut params = vec![("engine", self.engine.name().to_string())];
        match self.engine {
            SerpEngine::Naver => {
                params.push(("query", query.username.clone()));
                params.push(("where", "web".to_string()));
            }
            SerpEngine::Baidu => {
                params.push(("q", query.username.clone()));
                params.push(("rn", query.limit.clamp(1, 50).to_string()));
            }
        }
        params.push(("api_key", key.to_string()));
        params
    }
}

#[async_trait]
impl Source for SerpApiSource {
    fn name(&self) -> &'static str {
        self.engine.name()
    }

    fn description(&self) -> &'static str {
        match self.engine {
            SerpEngine::Naver => "Naver web search via SerpApi (needs SERPAPI_API_KEY)",
            SerpEngine::Baidu => "Baidu web search via SerpApi (needs SERPAPI_API_KEY)",
        }
    }

    async fn search(&self, query: &SourceQuery) -> Result<Vec<RawHit>, SourceError> {
        let key = self.api_key.as_deref().ok_or_else(|| {
            SourceError::MissingCredentials("set SERPAPI_API_KEY to use SerpApi sources".into())
        })?;

        let started = Instant::now();
        let client = http_client(query)?;
        let resp = client
            .get(format!("{}/search.json", self.base_url))
            .query(&self.params(query, key))
            .send()
            .await
            .map_err(SourceError::HttpRequest)?;
        let status = resp.status();
        let body = resp.text().await.map_err(SourceError::HttpRequest)?;
        let parsed: SerpResponse = serde_json::from_str(&body)?;

        if let Some(error) = parsed.error {
            // SerpApi reports an empty result page as an error string.
            if error.contains("hasn't returned any results") {
                return Ok(Vec::new());
            }
            return Err(SourceError::Other(format!("SerpApi error: {}", error)));
        }
        if !status.is_success() {
            return Err(SourceError::Other(format!("SerpApi returned status: {}", status)));
        }

        let hits = organic_hits(parsed.organic_results);
        match self.engine {
            SerpEngine::Baidu => {
                // Redirect lookups share whatever is left of the request timeout.
                let remaining = query.timeout.saturating_sub(started.elapsed());
                let redirects = non_redirecting_client(query)?;
                match tokio::time::timeout(remaining, resolve_redirects(&redirects, hits.clone()))
                    .await
                {
                    Ok(resolved) => Ok(resolved),
                    Err(_) => {
                        debug!(count = hits.len(), "redirect lookups ran out of time");
                        Ok(hits)
                    }
                }
            }
            SerpEngine::Naver => Ok(hits),
        }
    }
}

fn organic_hits(results: Vec<OrganicResult>) -> Vec<RawHit> {
    results
        .into_iter()
        .filter_map(|r| {
            let link = r.link?;
            let title = html_escape::decode_html_entities(&r.title?).to_string();
            Some(RawHit::new(link, strip_tags(&title)))
        })
        .collect()
}

/// Baidu titles carry `<em>` highlight markup.
fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;
    for c in s.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

/// Baidu result links are `baidu.com/link?url=...` redirects; replace each with its
/// `Location` target. Links that cannot be resolved keep their original URL.
async fn resolve_redirects(client: &Client, hits: Vec<RawHit>) -> Vec<RawHit> {
    let lookups = hits.into_iter().map(|mut hit| async move {
        match client.get(&hit.url).send().await {
            Ok(resp) => {
                if let Some(target) = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|v| v.to_str().ok())
                    .filter(|v| v.starts_with("http"))
                {
                    hit.url = target.to_string();
                }
            }
            Err(e) => debug!(url = %hit.url, error = %e, "could not resolve redirect"),
        }
        hit
    });

    futures::future::join_all(lookups).await
}
