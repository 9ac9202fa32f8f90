//! The run: fetch → summarize → compose → send.
//!
//! Every step runs to completion before the next starts and every request is
//! awaited on its own, so a run issues exactly one network call at a time.
//! Feed and summarization failures are absorbed by their steps; only mail
//! delivery can fail the run.

use crate::api::{HfSummarizer, RetrySummarize, Summarize, summarize_article};
use crate::config::RunConfig;
use crate::error::DigestError;
use crate::feeds;
use crate::mail::MailSender;
use crate::models::{Article, Digest, RunReport, SummarizedArticle};
use crate::outputs::compose_digest;
use crate::utils::local_date;
use futures::stream::{self, StreamExt};
use reqwest::Client;
use std::io::{self, Write};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; news_digest/0.1)";

/// Base delay between summarization retries.
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// Shared HTTP client with the run's timeout applied to every request.
pub fn build_client(config: &RunConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(config.timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// Summarize articles one after another, pausing between requests.
#[instrument(level = "info", skip_all, fields(count = articles.len()))]
pub async fn summarize_all<S: Summarize>(
    summarizer: &S,
    articles: Vec<Article>,
    pause: Duration,
) -> Vec<SummarizedArticle> {
    stream::iter(articles.into_iter().enumerate())
        .then(|(i, article)| async move {
            if i > 0 && !pause.is_zero() {
                sleep(pause).await;
            }
            debug!(index = i, link = %article.link, "Summarizing article");
            summarize_article(summarizer, article).await
        })
        .collect()
        .await
}

/// Fetch, summarize, and compose, without sending.
#[instrument(level = "info", skip_all)]
pub async fn collect_digest(
    config: &RunConfig,
    client: &Client,
    date: &str,
) -> (Digest, RunReport) {
    let outcomes = feeds::fetch_all(
        client,
        &config.feeds,
        config.max_per_category,
        !config.feed_text_only,
    )
    .await;

    let mut report = RunReport::default();
    let mut articles = Vec::new();
    for outcome in outcomes {
        match outcome.result {
            Ok(found) => {
                report.feeds_ok += 1;
                articles.extend(found);
            }
            Err(_) => report.feeds_failed += 1,
        }
    }
    info!(
        feeds_ok = report.feeds_ok,
        feeds_failed = report.feeds_failed,
        articles = articles.len(),
        "Articles to summarize"
    );

    let summarizer = RetrySummarize::new(
        HfSummarizer::new(
            client.clone(),
            config.summarizer_endpoint.clone(),
            config.hf_api_token.clone(),
            config.max_input_chars,
        ),
        config.summary_retries,
        RETRY_BASE_DELAY,
    );
    let summarized = summarize_all(&summarizer, articles, config.pause).await;

    report.articles = summarized.len();
    report.summaries_failed = summarized.iter().filter(|a| !a.summarized).count();
    info!(
        total = report.articles,
        failed = report.summaries_failed,
        "Completed article summarization"
    );

    (
        compose_digest(date, &config.categories(), summarized),
        report,
    )
}

/// Write the dry-run rendition of `digest`: subject line, blank line, text body.
pub fn write_dry_run(out: &mut impl Write, digest: &Digest) -> io::Result<()> {
    writeln!(out, "Subject: {}\n", digest.subject)?;
    out.write_all(digest.text_body.as_bytes())?;
    out.flush()
}

/// Execute one complete run.
///
/// Returns the report on delivery (or after printing, in dry-run mode).
/// Mail delivery errors are returned and end the run as a failure.
#[instrument(level = "info", skip_all)]
pub async fn run(config: &RunConfig) -> Result<RunReport, DigestError> {
    let client = build_client(config)?;
    let date = local_date();

    let (digest, mut report) = collect_digest(config, &client, &date).await;

    if config.dry_run {
        info!("Dry run; printing digest instead of sending");
        if let Err(e) = write_dry_run(&mut io::stdout().lock(), &digest) {
            warn!(error = %e, "Failed to write digest to stdout");
        }
        return Ok(report);
    }

    MailSender::from_config(config).send(&digest).await?;
    report.sent = true;
    Ok(report)
}
