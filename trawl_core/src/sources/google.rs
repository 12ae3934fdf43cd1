use super::{clean_title, fetch_text, http_client};
use crate::error::SourceError;
use crate::{RawHit, Source, SourceQuery};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://www.google.com";

static RESULT_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.g").expect("valid result selector"));
static LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("valid link selector"));
static TITLE_SEL: Lazy<Selector> = Lazy::new(|| Selector::parse("h3").expect("valid title selector"));

/// Google web results, scraped from the HTML search page.
pub struct GoogleSource {
    base_url: String,
    quoted: bool,
}

impl Default for GoogleSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            quoted: true,
        }
    }
}

impl GoogleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Search for the bare username instead of the exact quoted phrase.
    pub fn unquoted(mut self) -> Self {
        self.quoted = false;
        self
    }

    fn query_params(&self, query: &SourceQuery) -> Vec<(&'static str, String)> {
        let q = if self.quoted {
            format!("\"{}\"", query.username)
        } else {
            query.username.clone()
        };
        vec![
            ("q", q),
            ("num", query.limit.to_string()),
            ("hl", query.language.clone()),
        ]
    }
}

#[async_trait]
impl Source for GoogleSource {
    fn name(&self) -> &'static str {
        "google"
    }

    fn description(&self) -> &'static str {
        "Google scraping (exact-phrase web search)"
    }

    async fn search(&self, query: &SourceQuery) -> Result<Vec<RawHit>, SourceError> {
        let client = http_client(query)?;
        let url = format!("{}/search", self.base_url);
        let html = fetch_text(&client, &url, &self.query_params(query)).await?;

        if html.contains("detected unusual traffic") || html.contains("/sorry/index") {
            return Err(SourceError::Blocked(
                "Google returned a CAPTCHA page".to_string(),
            ));
        }

        Ok(parse_results(&html))
    }
}

/// Extract `(href, h3)` pairs from every `div.g` result block.
pub(crate) fn parse_results(html: &str) -> Vec<RawHit> {
    let document = Html::parse_document(html);
    let mut hits = Vec::new();

    for block in document.select(&RESULT_SEL) {
        let href = block
            .select(&LINK_SEL)
            .next()
            .and_then(|a| a.value().attr("href"));
        let title = block
            .select(&TITLE_SEL)
            .next()
            .map(|h| clean_title(&h.text().collect::<String>()));

        if let (Some(href), Some(title)) = (href, title) {
            if let Some(url) = resolve_href(href) {
                hits.push(RawHit::new(url, title));
            }
        }
    }

    hits
}

/// Unwrap `/url?q=<target>&sa=...` redirects; keep absolute links as-is.
fn resolve_href(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if href.starts_with("/url?") {
        let parsed = Url::parse(DEFAULT_BASE_URL).ok()?.join(href).ok()?;
        return parsed
            .query_pairs()
            .find(|(k, _)| k == "q" || k == "url")
            .map(|(_, v)| v.into_owned())
            .filter(|v| v.starts_with("http"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r##"
        <html><body><div id="search">
          <div class="g">
            <a href="https://github.com/johndoe"><h3>johndoe (John Doe) · GitHub</h3></a>
          </div>
          <div class="g">
            <a href="/url?q=https://twitter.com/johndoe&amp;sa=U&amp;ved=abc">
              <h3>John Doe (@johndoe) / X</h3>
            </a>
          </div>
          <div class="g"><a href="#top">Top</a></div>
          <div class="g"><h3>Orphan title without link</h3></div>
        </div></body></html>
    "##;

    #[test]
    fn test_parse_result_blocks() {
        let hits = parse_results(PAGE);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://github.com/johndoe");
        assert_eq!(hits[0].title, "johndoe (John Doe) · GitHub");
        assert_eq!(hits[1].url, "https://twitter.com/johndoe");
        assert_eq!(hits[1].title, "John Doe (@johndoe) / X");
    }

    #[test]
    fn test_parse_empty_page() {
        assert!(parse_results("<html><body>No results</body></html>").is_empty());
    }

    #[test]
    fn test_query_is_quoted_by_default() {
        let mut query = SourceQuery::new("johndoe");
        query.limit = 50;
        let params = GoogleSource::new().query_params(&query);
        assert_eq!(params[0], ("q", "\"johndoe\"".to_string()));
        assert_eq!(params[1], ("num", "50".to_string()));
        assert_eq!(params[2], ("hl", "en".to_string()));

        let params = GoogleSource::new().unquoted().query_params(&query);
        assert_eq!(params[0], ("q", "johndoe".to_string()));
    }
}
