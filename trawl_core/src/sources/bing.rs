use super::{clean_title, fetch_text, http_client};
use crate::error::SourceError;
use crate::{RawHit, Source, SourceQuery};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};

const DEFAULT_BASE_URL: &str = "https://www.bing.com";

/// Bing caps a single result page at 50 entries.
const MAX_PAGE_SIZE: u32 = 50;

static RESULT_LINK_SEL: Lazy<Selector> =
    Lazy::new(|| Selector::parse("li.b_algo h2 a[href]").expect("valid result selector"));

pub struct BingSource {
    base_url: String,
}

impl Default for BingSource {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl BingSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Source for BingSource {
    fn name(&self) -> &'static str {
        "bing"
    }

    fn description(&self) -> &'static str {
        "Bing scraping (first result page)"
    }

    async fn search(&self, query: &SourceQuery) -> Result<Vec<RawHit>, SourceError> {
        let client = http_client(query)?;
        let url = format!("{}/search", self.base_url);
        let params = [
            ("q", query.username.clone()),
            ("count", query.limit.clamp(1, MAX_PAGE_SIZE).to_string()),
            ("setlang", query.language.clone()),
        ];
        let html = fetch_text(&client, &url, &params).await?;
        Ok(parse_results(&html))
    }
}

pub(crate) fn parse_results(html: &str) -> Vec<RawHit> {
    let document = Html::parse_document(html);

    document
        .select(&RESULT_LINK_SEL)
        .filter_map(|a| {
            let href = a.value().attr("href")?;
            if !href.starts_with("http") {
                return None;
            }
            Some(RawHit::new(href, clean_title(&a.text().collect::<String>())))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_algo_blocks() {
        let html = r#"
            <ol id="b_results">
              <li class="b_algo"><h2><a href="https://www.instagram.com/johndoe/">John (@johndoe) • Instagram</a></h2></li>
              <li class="b_ad"><h2><a href="https://ads.example/">Sponsored</a></h2></li>
              <li class="b_algo"><h2><a href="/images/search?q=johndoe">Images</a></h2></li>
              <li class="b_algo"><div><h2><a href="https://medium.com/@johndoe">John Doe – Medium</a></h2></div></li>
            </ol>
        "#;

        let hits = parse_results(html);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].url, "https://www.instagram.com/johndoe/");
        assert_eq!(hits[0].title, "John (@johndoe) • Instagram");
        assert_eq!(hits[1].url, "https://medium.com/@johndoe");
    }
}
