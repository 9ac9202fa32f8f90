//! Data models for one digest run.
//!
//! - [`FeedSource`]: a configured RSS/Atom URL and the category it belongs to
//! - [`Article`]: an entry taken from a feed
//! - [`SummarizedArticle`]: an article with its summary attached
//! - [`FeedOutcome`]: the tagged result of fetching one source
//! - [`Digest`]: the rendered message handed to the mail sender
//!
//! Nothing here outlives the process.

use crate::error::FeedError;

/// A feed URL and the category label its articles are filed under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    pub category: String,
    pub url: String,
}

/// An entry read from a feed.
///
/// `raw_text` is already stripped of markup and bounded in length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Article {
    /// Category of the feed the entry came from.
    pub category: String,
    /// URL of the feed the entry came from.
    pub source: String,
    pub title: String,
    pub link: String,
    pub raw_text: String,
}

/// An [`Article`] with the summary that will appear in the digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummarizedArticle {
    pub article: Article,
    pub summary: String,
    /// False when `summary` is the fallback marker.
    pub summarized: bool,
}

/// The result of fetching one source: its articles, or why it was skipped.
#[derive(Debug)]
pub struct FeedOutcome {
    pub source: FeedSource,
    pub result: Result<Vec<Article>, FeedError>,
}

impl FeedOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// The composed digest for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    /// Local date the digest covers, `YYYY-MM-DD`.
    pub date: String,
    pub subject: String,
    pub articles: Vec<SummarizedArticle>,
    pub text_body: String,
    pub html_body: String,
}

/// What happened during a run, logged once at the end.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub feeds_ok: usize,
    pub feeds_failed: usize,
    pub articles: usize,
    pub summaries_failed: usize,
    pub sent: bool,
}
