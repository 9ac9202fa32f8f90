//! Run configuration: validation of CLI/environment input and the feed catalog.
//!
//! [`RunConfig::from_cli`] is the only place configuration is checked. It does
//! no I/O beyond reading an optional catalog file, so a bad configuration
//! stops the run before any request is made.

use crate::cli::Cli;
use crate::error::ConfigError;
use crate::models::FeedSource;
use itertools::Itertools;
use lettre::message::Mailbox;
use std::fmt;
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

/// Feeds used when no catalog file is given, grouped by category.
pub const DEFAULT_FEEDS: &[(&str, &[&str])] = &[
    (
        "IT",
        &[
            "https://techcrunch.com/feed/",
            "https://news.ycombinator.com/rss",
            "https://www.wired.com/feed/rss.xml",
            "https://www.computerweekly.com/rss",
            "https://www.techrepublic.com/rssfeeds/",
            "https://www.gadgets360.com/rss",
        ],
    ),
    (
        "Finance",
        &[
            "https://www.nasdaq.com/feed/rssoutbound?category=Top-News",
            "https://www.nasdaq.com/feed/rssoutbound?category=Market-Headlines",
            "https://www.investing.com/rss/stock_stock_picks.rss",
            "https://www.nasdaq.com/feed/rssoutbound?category=Market-News",
        ],
    ),
    (
        "Cryptocurrency",
        &["https://www.nasdaq.com/feed/rssoutbound?category=Cryptocurrencies"],
    ),
    ("Global-Politics", &["https://www.crisisgroup.org/rss"]),
    ("Moroccan-Politics", &["https://www.crisisgroup.org/rss/133"]),
    ("French-Politics", &["https://www.crisisgroup.org/rss/169"]),
];

/// Immutable settings for one run.
#[derive(Clone)]
pub struct RunConfig {
    pub hf_api_token: String,
    /// Full URL of the summarization model endpoint.
    pub summarizer_endpoint: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_pass: String,
    pub email_from: Mailbox,
    pub email_to: Mailbox,
    pub feeds: Vec<FeedSource>,
    pub max_per_category: usize,
    pub max_input_chars: usize,
    pub summary_retries: usize,
    pub timeout: Duration,
    pub pause: Duration,
    pub feed_text_only: bool,
    pub dry_run: bool,
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("hf_api_token", &"<redacted>")
            .field("summarizer_endpoint", &self.summarizer_endpoint)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_user", &self.smtp_user)
            .field("smtp_pass", &"<redacted>")
            .field("email_from", &self.email_from.to_string())
            .field("email_to", &self.email_to.to_string())
            .field("feeds", &self.feeds.len())
            .field("max_per_category", &self.max_per_category)
            .field("max_input_chars", &self.max_input_chars)
            .field("summary_retries", &self.summary_retries)
            .field("timeout", &self.timeout)
            .field("pause", &self.pause)
            .field("feed_text_only", &self.feed_text_only)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl RunConfig {
    /// Validate parsed arguments into a [`RunConfig`].
    ///
    /// Required values are checked in a fixed order (`HF_API_TOKEN`,
    /// `SMTP_USER`, `SMTP_PASS`, `EMAIL_TO`) and blank values count as missing.
    #[instrument(level = "info", skip_all)]
    pub fn from_cli(cli: Cli) -> Result<Self, ConfigError> {
        let hf_api_token = required(cli.hf_api_token, "HF_API_TOKEN")?;
        let smtp_user = required(cli.smtp_user, "SMTP_USER")?;
        let smtp_pass = required(cli.smtp_pass, "SMTP_PASS")?;
        let email_to = required(cli.email_to, "EMAIL_TO")?;

        let email_to = parse_mailbox(&email_to, "EMAIL_TO")?;
        let email_from = match cli.email_from.filter(|v| !v.trim().is_empty()) {
            Some(from) => parse_mailbox(&from, "EMAIL_FROM")?,
            None => parse_mailbox(&smtp_user, "SMTP_USER")?,
        };

        let feeds = match cli.feeds.as_deref() {
            Some(path) => load_catalog(path)?,
            None => default_feeds()?,
        };
        info!(feeds = feeds.len(), "Loaded feed catalog");

        Ok(Self {
            hf_api_token,
            summarizer_endpoint: format!(
                "{}/{}",
                cli.hf_api_url.trim_end_matches('/'),
                cli.model.trim_start_matches('/')
            ),
            smtp_host: cli.smtp_host,
            smtp_port: cli.smtp_port,
            smtp_user,
            smtp_pass,
            email_from,
            email_to,
            feeds,
            max_per_category: cli.max_per_category,
            max_input_chars: cli.max_input_chars,
            summary_retries: cli.summary_retries,
            timeout: Duration::from_secs(cli.timeout_secs),
            pause: Duration::from_millis(cli.pause_ms),
            feed_text_only: cli.feed_text_only,
            dry_run: cli.dry_run,
        })
    }

    /// Catalog categories, each once, in catalog order.
    pub fn categories(&self) -> Vec<&str> {
        self.feeds
            .iter()
            .map(|feed| feed.category.as_str())
            .unique()
            .collect()
    }
}

fn required(value: Option<String>, var: &'static str) -> Result<String, ConfigError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(var))
}

fn parse_mailbox(value: &str, var: &'static str) -> Result<Mailbox, ConfigError> {
    value
        .parse::<Mailbox>()
        .map_err(|e| ConfigError::InvalidMailbox {
            var,
            reason: e.to_string(),
        })
}

fn feed_source(category: &str, url: &str) -> Result<FeedSource, ConfigError> {
    let parsed = Url::parse(url).map_err(|e| ConfigError::InvalidFeedUrl {
        category: category.to_string(),
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidFeedUrl {
            category: category.to_string(),
            url: url.to_string(),
            reason: format!("unsupported scheme {}", parsed.scheme()),
        });
    }
    Ok(FeedSource {
        category: category.to_string(),
        url: url.to_string(),
    })
}

/// The built-in catalog as [`FeedSource`]s, in declaration order.
pub fn default_feeds() -> Result<Vec<FeedSource>, ConfigError> {
    DEFAULT_FEEDS
        .iter()
        .flat_map(|(category, urls)| urls.iter().map(move |url| feed_source(category, url)))
        .collect()
}

/// Parse a YAML catalog of `Category: [url, ...]`, keeping key order.
pub fn parse_catalog(yaml: &str, path: &str) -> Result<Vec<FeedSource>, ConfigError> {
    let parse_err = |source| ConfigError::CatalogParse {
        path: path.to_string(),
        source,
    };

    let mapping: serde_yaml::Mapping = serde_yaml::from_str(yaml).map_err(parse_err)?;
    let mut feeds = Vec::new();
    for (key, value) in mapping {
        let category: String = serde_yaml::from_value(key).map_err(parse_err)?;
        let urls: Vec<String> = serde_yaml::from_value(value).map_err(parse_err)?;
        for url in urls {
            feeds.push(feed_source(category.trim(), url.trim())?);
        }
    }

    if feeds.is_empty() {
        return Err(ConfigError::EmptyCatalog);
    }
    Ok(feeds)
}

/// Read and parse a catalog file.
#[instrument(level = "info", skip_all, fields(%path))]
pub fn load_catalog(path: &str) -> Result<Vec<FeedSource>, ConfigError> {
    let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::CatalogIo {
        path: path.to_string(),
        source,
    })?;
    parse_catalog(&yaml, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REQUIRED: [&str; 9] = [
        "news_digest",
        "--hf-api-token",
        "hf_token",
        "--smtp-user",
        "digest@example.com",
        "--smtp-pass",
        "app-password",
        "--email-to",
        "reader@example.com",
    ];

    fn cli_without(flag: &str) -> Cli {
        let mut args: Vec<&str> = Vec::new();
        let mut iter = REQUIRED.iter();
        while let Some(arg) = iter.next() {
            if *arg == flag {
                iter.next();
                continue;
            }
            args.push(*arg);
        }
        Cli::parse_without_env(args)
    }

    #[test]
    fn test_from_cli_complete() {
        let config = RunConfig::from_cli(Cli::parse_without_env(REQUIRED)).unwrap();

        assert_eq!(config.hf_api_token, "hf_token");
        assert_eq!(config.email_to.email.to_string(), "reader@example.com");
        assert_eq!(config.email_from.email.to_string(), "digest@example.com");
        assert_eq!(
            config.summarizer_endpoint,
            "https://router.huggingface.co/hf-inference/models/sshleifer/distilbart-cnn-12-6"
        );
        assert_eq!(config.max_input_chars, 3000);
        assert_eq!(config.feeds.len(), 14);
        assert_eq!(config.feeds[0].category, "IT");
    }

    #[test]
    fn test_each_required_variable_is_enforced() {
        for (flag, var) in [
            ("--hf-api-token", "HF_API_TOKEN"),
            ("--smtp-user", "SMTP_USER"),
            ("--smtp-pass", "SMTP_PASS"),
            ("--email-to", "EMAIL_TO"),
        ] {
            match RunConfig::from_cli(cli_without(flag)) {
                Err(ConfigError::Missing(missing)) => assert_eq!(missing, var),
                other => panic!("expected Missing({var}), got {other:?}"),
            }
        }
    }

    #[test]
    fn test_missing_credentials_reported_in_order() {
        let cli = Cli::parse_without_env(["news_digest", "--email-to", "reader@example.com"]);
        assert!(matches!(
            RunConfig::from_cli(cli),
            Err(ConfigError::Missing("HF_API_TOKEN"))
        ));
    }

    #[test]
    fn test_categories_unique_in_catalog_order() {
        let mut config = RunConfig::from_cli(Cli::parse_without_env(REQUIRED)).unwrap();
        config.feeds = parse_catalog(
            "Finance:\n  - https://a.example.com/rss\n  - https://b.example.com/rss\nIT:\n  - https://c.example.com/rss\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.categories(), vec!["Finance", "IT"]);
    }

    #[test]
    fn test_blank_value_counts_as_missing() {
        let mut cli = Cli::parse_without_env(REQUIRED);
        cli.smtp_pass = Some("   ".to_string());
        assert!(matches!(
            RunConfig::from_cli(cli),
            Err(ConfigError::Missing("SMTP_PASS"))
        ));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut cli = Cli::parse_without_env(REQUIRED);
        cli.email_to = Some("not an address".to_string());
        assert!(matches!(
            RunConfig::from_cli(cli),
            Err(ConfigError::InvalidMailbox { var: "EMAIL_TO", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = RunConfig::from_cli(Cli::parse_without_env(REQUIRED)).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("hf_token"));
        assert!(!debug.contains("app-password"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_parse_catalog_keeps_order() {
        let yaml = "Zeta:\n  - https://z.example.com/rss\nAlpha:\n  - https://a.example.com/feed\n  - https://b.example.com/atom.xml\n";
        let feeds = parse_catalog(yaml, "inline").unwrap();

        assert_eq!(feeds.len(), 3);
        assert_eq!(feeds[0].category, "Zeta");
        assert_eq!(feeds[1].category, "Alpha");
        assert_eq!(feeds[2].url, "https://b.example.com/atom.xml");
    }

    #[test]
    fn test_parse_catalog_rejects_bad_url() {
        let yaml = "IT:\n  - ftp://example.com/rss\n";
        assert!(matches!(
            parse_catalog(yaml, "inline"),
            Err(ConfigError::InvalidFeedUrl { .. })
        ));
    }

    #[test]
    fn test_parse_catalog_rejects_empty() {
        assert!(matches!(
            parse_catalog("{}", "inline"),
            Err(ConfigError::EmptyCatalog)
        ));
    }

    #[test]
    fn test_load_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "Finance:\n  - https://example.com/markets.rss").unwrap();

        let feeds = load_catalog(file.path().to_str().unwrap()).unwrap();
        assert_eq!(
            feeds,
            vec![FeedSource {
                category: "Finance".to_string(),
                url: "https://example.com/markets.rss".to_string(),
            }]
        );
    }

    #[test]
    fn test_load_catalog_missing_file() {
        assert!(matches!(
            load_catalog("/nonexistent/feeds.yaml"),
            Err(ConfigError::CatalogIo { .. })
        ));
    }
}
