//! Search-provider adapters.
//!
//! Each adapter owns its transport for the duration of one `search` call: the
//! [`reqwest::Client`] built by [`http_client`] is dropped when the call returns,
//! whatever the outcome.

#[cfg(feature = "bing")]
pub mod bing;
#[cfg(feature = "duckduckgo")]
pub mod duckduckgo;
#[cfg(feature = "google")]
pub mod google;
#[cfg(any(feature = "naver", feature = "baidu"))]
pub mod serpapi;

use crate::error::SourceError;
use crate::SourceQuery;
use reqwest::{redirect, Client, StatusCode};

pub const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:84.0) Gecko/20100101 Firefox/84.0";

/// Build a per-invocation HTTP client honouring the query's proxy and timeout.
pub(crate) fn http_client(query: &SourceQuery) -> Result<Client, SourceError> {
    client_builder(query)?
        .build()
        .map_err(SourceError::HttpRequest)
}

/// Same as [`http_client`] but never follows redirects, so `Location` headers can be read.
#[allow(dead_code)]
pub(crate) fn non_redirecting_client(query: &SourceQuery) -> Result<Client, SourceError> {
    client_builder(query)?
        .redirect(redirect::Policy::none())
        .build()
        .map_err(SourceError::HttpRequest)
}

fn client_builder(query: &SourceQuery) -> Result<reqwest::ClientBuilder, SourceError> {
    let mut builder = Client::builder()
        .user_agent(BROWSER_USER_AGENT)
        .cookie_store(true)
        .timeout(query.timeout);

    if let Some(proxy) = query.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy)
            .map_err(|e| SourceError::InvalidInput(format!("invalid proxy '{}': {}", proxy, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder)
}

/// GET a page and return its body, turning error statuses into [`SourceError`]s.
#[allow(dead_code)]
pub(crate) async fn fetch_text(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, SourceError> {
    let response = client
        .get(url)
        .query(query)
        .send()
        .await
        .map_err(SourceError::HttpRequest)?;

    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::FORBIDDEN {
        return Err(SourceError::Blocked(format!("{} returned {}", url, status)));
    }
    if !status.is_success() {
        return Err(SourceError::Other(format!("{} returned status: {}", url, status)));
    }

    response.text().await.map_err(SourceError::HttpRequest)
}

/// Trim a scraped title and collapse inner whitespace.
#[allow(dead_code)]
pub(crate) fn clean_title(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("  John\n   Doe  - GitHub "), "John Doe - GitHub");
        assert_eq!(clean_title(""), "");
    }

    #[test]
    fn test_invalid_proxy_is_invalid_input() {
        let mut query = SourceQuery::new("john");
        query.proxy = Some("not a proxy url".into());
        query.timeout = Duration::from_secs(1);
        match http_client(&query) {
            Err(SourceError::InvalidInput(msg)) => assert!(msg.contains("invalid proxy")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected invalid proxy error"),
        }
    }

    #[test]
    fn test_blank_proxy_is_ignored() {
        let mut query = SourceQuery::new("john");
        query.proxy = Some("   ".into());
        assert!(http_client(&query).is_ok());
    }
}
