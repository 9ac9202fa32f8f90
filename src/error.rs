//! Error types for each stage of a digest run.
//!
//! Only [`DigestError`] ever reaches `main`. Feed and summarization errors are
//! caught where they happen and turned into a skipped source or a fallback
//! summary, so they never abort a run.

use reqwest::StatusCode;
use thiserror::Error;

/// Invalid or missing run configuration. Always raised before any network call.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),

    #[error("invalid mailbox in {var}: {reason}")]
    InvalidMailbox { var: &'static str, reason: String },

    #[error("invalid feed URL {url:?} in category {category:?}: {reason}")]
    InvalidFeedUrl {
        category: String,
        url: String,
        reason: String,
    },

    #[error("failed to read feed catalog {path}: {source}")]
    CatalogIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse feed catalog {path}: {source}")]
    CatalogParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("feed catalog is empty")]
    EmptyCatalog,
}

/// Failure to fetch or parse one feed. The feed is skipped.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(StatusCode),

    #[error("response is not an RSS/Atom document (content-type {0:?})")]
    NotXml(String),

    #[error("failed to parse feed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

/// Failure to summarize one article. The article keeps a fallback summary.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("endpoint reported: {0}")]
    Endpoint(String),

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl SummarizeError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SummarizeError::Request(_) => true,
            SummarizeError::Status { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            SummarizeError::Endpoint(msg) => msg.to_lowercase().contains("loading"),
            SummarizeError::Malformed(_) => false,
        }
    }
}

/// Failure to deliver the digest. Always fatal.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Fatal errors that end a run with a non-zero exit status.
#[derive(Debug, Error)]
pub enum DigestError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("mail delivery failed: {0}")]
    Mail(#[from] MailError),
}
