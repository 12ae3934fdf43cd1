use super::{clean_title, fetch_text, http_client};
use crate::error::SourceError;
use crate::{RawHit, Source, SourceQuery};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://html.duckduckgo.com";

static RESULT_LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.result__a[href]").expect("valid result selector"));

/// DuckDuckGo results from the JavaScript-free HTML endpoint.
pub struct DuckDuckGoSource {
    base_url: String,
}

impl Default for DuckDuckGoSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl DuckDuckGoSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Source for DuckDuckGoSource {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    fn description(&self) -> &'static str {
        "DuckDuckGo scraping (HTML endpoint)"
    }

    async fn search(&self, query: &SourceQuery) -> Result<Vec<RawHit>, SourceError> {
        let client = http_client(query)?;
        let url = format!("{}/html/", self.base_url);
        let html = fetch_text(&client, &url, &[("q", query.username.clone())]).await?;

        let mut hits = parse_results(&html);
        hits.truncate(query.limit as usize);
        Ok(hits)
    }
}

pub(crate) fn parse_results(html: &str) -> Vec<RawHit> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_LINK_SEL)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            let title = clean_title(&a.text().collect::<String>());
            if title.is_empty() {
                return None;
            }
            Some(RawHit::new(unwrap_redirect(href)?, title))
        })
        .collect()
}

/// Result anchors point at `//duckduckgo.com/l/?uddg=<encoded target>`; return the target.
fn unwrap_redirect(href: &str) -> Option<String> {
    let absolute = Url::parse("https://duckduckgo.com").ok()?.join(href).ok()?;

    if absolute.path().starts_with("/l/") {
        return absolute
            .query_pairs()
            .find(|(k, _)| k == "uddg")
            .map(|(_, v)| v.into_owned());
    }

    match absolute.scheme() {
        "http" | "https" => Some(absolute.to_string()),
        _ => None,
    }
}
