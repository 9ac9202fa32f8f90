//! Feed fetching: from configured [`FeedSource`]s to [`Article`]s.
//!
//! Each source is fetched on its own and its failure is recorded in a
//! [`FeedOutcome`] instead of being propagated, so one broken feed only
//! removes that feed's articles from the digest.
//!
//! # Submodules
//!
//! - [`parse`]: RSS/Atom entries to articles
//! - [`extract`]: optional full-text download of each article page
//!
//! Sources are consumed in catalog order. Once a category holds
//! `max_per_category` articles its remaining feeds are not requested.

pub mod extract;
pub mod parse;

use crate::error::FeedError;
use crate::models::{Article, FeedOutcome, FeedSource};
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::collections::HashMap;
use tracing::{debug, error, info, instrument};

/// Fetch and parse a single feed.
#[instrument(level = "info", skip_all, fields(url = %source.url, category = %source.category))]
pub async fn fetch_feed(client: &Client, source: &FeedSource) -> Result<Vec<Article>, FeedError> {
    let response = client.get(&source.url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status(status));
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_ascii_lowercase();
    if !is_feed_content_type(&content_type) {
        return Err(FeedError::NotXml(content_type));
    }

    let bytes = response.bytes().await?;
    parse::parse_articles(source, &bytes)
}

fn is_feed_content_type(content_type: &str) -> bool {
    ["xml", "rss", "atom"]
        .iter()
        .any(|needle| content_type.contains(needle))
}

/// Fetch every source in order, keeping at most `max_per_category` articles
/// per category.
///
/// Returns one [`FeedOutcome`] per source that was requested. With
/// `full_text` set, each kept article's page is downloaded as well.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn fetch_all(
    client: &Client,
    sources: &[FeedSource],
    max_per_category: usize,
    full_text: bool,
) -> Vec<FeedOutcome> {
    let mut taken: HashMap<&str, usize> = HashMap::new();
    let mut outcomes = Vec::with_capacity(sources.len());

    for source in sources {
        let count = taken.entry(source.category.as_str()).or_insert(0);
        let room = max_per_category.saturating_sub(*count);
        if room == 0 {
            debug!(url = %source.url, category = %source.category, "Category full; not fetching");
            continue;
        }

        info!(url = %source.url, category = %source.category, "Fetching feed");
        let result = match fetch_feed(client, source).await {
            Ok(mut articles) => {
                info!(url = %source.url, found = articles.len(), "Fetched feed");
                articles.truncate(room);
                *count += articles.len();
                if full_text {
                    articles = extract::enrich_articles(client, articles).await;
                }
                Ok(articles)
            }
            Err(e) => {
                error!(url = %source.url, error = %e, "Feed fetch failed; skipping source");
                Err(e)
            }
        };

        outcomes.push(FeedOutcome {
            source: source.clone(),
            result,
        });
    }

    let ok = outcomes.iter().filter(|o| o.is_ok()).count();
    info!(ok, failed = outcomes.len() - ok, "Finished fetching feeds");
    outcomes
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss(items: &[(&str, &str)]) -> String {
        let items: String = items
            .iter()
            .map(|(title, link)| {
                format!(
                    "<item><title>{title}</title><link>{link}</link><description>About {title}</description></item>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0"?><rss version="2.0"><channel><title>t</title><link>https://example.com</link><description>d</description>{items}</channel></rss>"#
        )
    }

    async fn mount_feed(server: &MockServer, route: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "application/rss+xml"))
            .mount(server)
            .await;
    }

    fn source(server: &MockServer, category: &str, route: &str) -> FeedSource {
        FeedSource {
            category: category.to_string(),
            url: format!("{}{}", server.uri(), route),
        }
    }

    #[test]
    fn test_feed_content_types() {
        assert!(is_feed_content_type("application/rss+xml; charset=utf-8"));
        assert!(is_feed_content_type("text/xml"));
        assert!(is_feed_content_type("application/atom+xml"));
        assert!(!is_feed_content_type("text/html"));
        assert!(!is_feed_content_type(""));
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_isolated() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            "/good",
            rss(&[("A", "https://e.com/a"), ("B", "https://e.com/b"), ("C", "https://e.com/c")]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/broken"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Client::new();
        let sources = vec![source(&server, "IT", "/broken"), source(&server, "IT", "/good")];
        let outcomes = fetch_all(&client, &sources, 5, false).await;

        assert_eq!(outcomes.len(), 2);
        assert!(matches!(outcomes[0].result, Err(FeedError::Status(s)) if s.as_u16() == 500));
        assert_eq!(outcomes[1].result.as_ref().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_html_response_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"))
            .mount(&server)
            .await;

        let client = Client::new();
        let result = fetch_feed(&client, &source(&server, "IT", "/page")).await;
        assert!(matches!(result, Err(FeedError::NotXml(ct)) if ct == "text/html"));
    }

    #[tokio::test]
    async fn test_category_cap_stops_fetching() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            "/first",
            rss(&[("A", "https://e.com/a"), ("B", "https://e.com/b"), ("C", "https://e.com/c")]),
        )
        .await;
        Mock::given(method("GET"))
            .and(path("/second"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        mount_feed(&server, "/other", rss(&[("X", "https://e.com/x")])).await;

        let client = Client::new();
        let sources = vec![
            source(&server, "IT", "/first"),
            source(&server, "IT", "/second"),
            source(&server, "Finance", "/other"),
        ];
        let outcomes = fetch_all(&client, &sources, 2, false).await;

        assert_eq!(outcomes.len(), 2);
        let first = outcomes[0].result.as_ref().unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].title, "A");
        assert_eq!(outcomes[1].source.category, "Finance");
    }
}
