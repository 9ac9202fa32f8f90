//! Turning a parsed RSS/Atom document into [`Article`]s.

use crate::error::FeedError;
use crate::models::{Article, FeedSource};
use crate::utils::{collapse_whitespace, strip_html, truncate_chars};
use feed_rs::model::Entry;
use tracing::debug;
use url::Url;

/// Upper bound, in characters, on the text kept for one article.
pub const MAX_BODY_CHARS: usize = 8000;

/// Title used for entries that carry none.
pub const UNTITLED: &str = "(no title)";

/// Parse feed bytes into articles filed under `source`.
///
/// Entries without any usable link are dropped.
pub fn parse_articles(source: &FeedSource, xml: &[u8]) -> Result<Vec<Article>, FeedError> {
    let feed = feed_rs::parser::parse(xml)?;
    let total = feed.entries.len();

    let articles: Vec<Article> = feed
        .entries
        .iter()
        .filter_map(|entry| entry_to_article(source, entry))
        .collect();

    debug!(
        url = %source.url,
        entries = total,
        kept = articles.len(),
        "Parsed feed entries"
    );
    Ok(articles)
}

fn entry_to_article(source: &FeedSource, entry: &Entry) -> Option<Article> {
    let link = entry_link(source, entry)?;

    let title = entry
        .title
        .as_ref()
        .map(|t| strip_html(&t.content))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| UNTITLED.to_string());

    let body = entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .filter(|b| !b.trim().is_empty())
        .or_else(|| entry.summary.as_ref().map(|s| s.content.as_str()))
        .unwrap_or_default();

    Some(Article {
        category: source.category.clone(),
        source: source.url.clone(),
        title,
        link,
        raw_text: bound_text(&strip_html(body)),
    })
}

/// Pick the link that points at the article itself.
///
/// Prefers an `alternate` or unlabelled link, then any link, then the entry
/// id. Relative links resolve against the feed URL and only http(s) results
/// are accepted, so `javascript:` or `data:` links never reach the digest.
fn entry_link(source: &FeedSource, entry: &Entry) -> Option<String> {
    let base = Url::parse(&source.url).ok();
    let web_url = |candidate: &str| -> Option<String> {
        let candidate = candidate.trim();
        if candidate.is_empty() {
            return None;
        }
        let url = match &base {
            Some(base) => base.join(candidate).ok()?,
            None => Url::parse(candidate).ok()?,
        };
        matches!(url.scheme(), "http" | "https").then(|| url.into())
    };

    let preferred = entry.links.iter().filter(|l| {
        let rel = l.rel.as_deref().unwrap_or("");
        rel.is_empty() || rel.eq_ignore_ascii_case("alternate")
    });
    preferred
        .chain(entry.links.iter())
        .find_map(|l| web_url(&l.href))
        .or_else(|| {
            let id = entry.id.trim();
            (id.starts_with("http://") || id.starts_with("https://"))
                .then(|| web_url(id))
                .flatten()
        })
}

/// Normalize whitespace and cap text at [`MAX_BODY_CHARS`].
pub fn bound_text(text: &str) -> String {
    truncate_chars(&collapse_whitespace(text), MAX_BODY_CHARS).to_string()
}
