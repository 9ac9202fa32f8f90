//! # News Digest
//!
//! A once-a-day batch job that collects articles from RSS/Atom feeds,
//! summarizes each one through a hosted summarization model, and emails a
//! single digest.
//!
//! ## Usage
//!
//! ```sh
//! HF_API_TOKEN=... SMTP_USER=... SMTP_PASS=... EMAIL_TO=... news_digest
//! ```
//!
//! ## Architecture
//!
//! The run is a straight pipeline, one request at a time:
//! 1. **Configuration**: environment (and `.env`) validated into a `RunConfig`
//! 2. **Fetching**: each feed is downloaded and parsed; broken feeds are skipped
//! 3. **Summarizing**: each article is summarized; failures get a fallback summary
//! 4. **Composing**: articles are rendered into text and HTML bodies
//! 5. **Sending**: the digest is submitted to the SMTP relay
//!
//! The process exits non-zero when configuration is invalid or delivery fails.

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod error;
mod feeds;
mod mail;
mod models;
mod outputs;
mod pipeline;
mod utils;

use cli::Cli;
use config::RunConfig;
use error::DigestError;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // --- Tracing init ---
    // Logs go to stderr; stdout carries the digest in dry-run mode.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let start_time = std::time::Instant::now();
    info!("news_digest starting up");

    match dotenvy::dotenv() {
        Ok(path) => debug!(path = %path.display(), "Loaded .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => error!(error = %e, "Ignoring unreadable .env file"),
    }

    let args = Cli::parse();

    match execute(args).await {
        Ok(report) => {
            let elapsed = start_time.elapsed();
            info!(
                ?elapsed,
                feeds_ok = report.feeds_ok,
                feeds_failed = report.feeds_failed,
                articles = report.articles,
                summaries_failed = report.summaries_failed,
                sent = report.sent,
                "Execution complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, elapsed = ?start_time.elapsed(), "Run failed");
            ExitCode::FAILURE
        }
    }
}

async fn execute(args: Cli) -> Result<models::RunReport, DigestError> {
    let config = RunConfig::from_cli(args)?;
    debug!(?config, "Validated configuration");
    pipeline::run(&config).await
}
