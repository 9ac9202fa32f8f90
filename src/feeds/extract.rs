//! Full-text extraction from an article's web page.
//!
//! Feeds often carry only a teaser. When enabled, each selected article's
//! page is downloaded and its paragraphs are used as the article text.

use super::parse::bound_text;
use crate::error::FeedError;
use crate::models::Article;
use crate::utils::element_text;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};

static ARTICLE_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article p").expect("static selector"));
static ALL_PARAGRAPHS: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector"));

/// Extract paragraph text from an HTML page.
///
/// Paragraphs inside `<article>` win; otherwise every `<p>` on the page is used.
/// Returns an empty string when the page has no paragraph text.
pub fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);

    let collect = |selector: &Selector| -> Vec<String> {
        document
            .select(selector)
            .map(element_text)
            .filter(|p| !p.is_empty())
            .collect()
    };

    let mut paragraphs = collect(&ARTICLE_PARAGRAPHS);
    if paragraphs.is_empty() {
        paragraphs = collect(&ALL_PARAGRAPHS);
    }
    paragraphs.join("\n")
}

/// Download one article page and extract its text.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article_text(client: &Client, url: &str) -> Result<String, FeedError> {
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status(status));
    }
    let body = response.text().await?;
    let text = extract_text(&body);
    debug!(chars = text.chars().count(), "Extracted article text");
    Ok(text)
}

/// Replace each article's feed text with its page text, one page at a time.
///
/// Failed or empty extractions leave the feed text untouched.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn enrich_articles(client: &Client, articles: Vec<Article>) -> Vec<Article> {
    let enriched: Vec<Article> = stream::iter(articles)
        .then(|mut article: Article| async move {
            match fetch_article_text(client, &article.link).await {
                Ok(text) if !text.trim().is_empty() => {
                    article.raw_text = bound_text(&text);
                }
                Ok(_) => {
                    debug!(url = %article.link, "Page had no paragraph text; keeping feed text");
                }
                Err(e) => {
                    warn!(url = %article.link, error = %e, "Article page fetch failed; keeping feed text");
                }
            }
            article
        })
        .collect()
        .await;

    info!(count = enriched.len(), "Fetched article page contents");
    enriched
}
