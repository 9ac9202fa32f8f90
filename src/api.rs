//! Summarization endpoint client with exponential backoff retry logic.
//!
//! # Architecture
//!
//! - [`Summarize`]: core trait, text in, summary out
//! - [`HfSummarizer`]: Hugging Face style inference endpoint (`{"inputs": ...}`)
//! - [`RetrySummarize`]: decorator that retries transient failures
//! - [`summarize_article`]: per-article entry point that never fails, falling
//!   back to [`FALLBACK_SUMMARY`]
//!
//! # Retry Strategy
//!
//! - Only transient errors are retried (transport, HTTP 429/5xx, model loading)
//! - Exponential backoff from the base delay, capped at 30 seconds
//! - Random jitter (0-250ms) added to each delay

use crate::error::SummarizeError;
use crate::models::{Article, SummarizedArticle};
use crate::utils::{truncate_chars, truncate_for_log};
use rand::{Rng, rng};
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::{Duration as StdDuration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Summary used when the endpoint could not produce one.
pub const FALLBACK_SUMMARY: &str = "[Summary unavailable]";

/// Generation limits sent with every request.
const MAX_NEW_TOKENS: u32 = 120;
const MIN_LENGTH: u32 = 30;

/// Trait for async summarization backends.
///
/// Implementors condense `text` into a shorter summary. Decorators such as
/// [`RetrySummarize`] wrap another implementor.
pub trait Summarize {
    /// Summarize `text`, or report why no summary could be produced.
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError>;
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters,
}

#[derive(Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
    min_length: u32,
}

/// Client for a hosted summarization model.
///
/// Sends `POST {endpoint}` with `Authorization: Bearer <token>` and a JSON
/// body whose `inputs` never exceeds `max_input_chars` characters.
pub struct HfSummarizer {
    client: Client,
    endpoint: String,
    token: String,
    max_input_chars: usize,
}

impl HfSummarizer {
    pub fn new(client: Client, endpoint: String, token: String, max_input_chars: usize) -> Self {
        Self {
            client,
            endpoint,
            token,
            max_input_chars,
        }
    }
}

impl fmt::Debug for HfSummarizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HfSummarizer")
            .field("endpoint", &self.endpoint)
            .field("max_input_chars", &self.max_input_chars)
            .finish()
    }
}

impl Summarize for HfSummarizer {
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let t0 = Instant::now();
        let inputs = truncate_chars(text, self.max_input_chars);
        let payload = InferenceRequest {
            inputs,
            parameters: InferenceParameters {
                max_new_tokens: MAX_NEW_TOKENS,
                min_length: MIN_LENGTH,
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&payload)
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;
        let dt = t0.elapsed();

        if !status.is_success() {
            warn!(elapsed_ms = dt.as_millis(), %status, "Summarization endpoint returned an error status");
            return Err(SummarizeError::Status {
                status,
                body: truncate_for_log(&body, 300),
            });
        }

        debug!(
            elapsed_ms = dt.as_millis(),
            input_chars = inputs.chars().count(),
            "Summarization endpoint responded"
        );
        parse_summary(&body)
    }
}

/// Pull the summary out of an inference response body.
///
/// Accepts `[{"summary_text": ..}]`, `[{"generated_text": ..}]` and
/// `{"summary_text": ..}`. An object carrying `error` is reported as
/// [`SummarizeError::Endpoint`].
pub fn parse_summary(body: &str) -> Result<String, SummarizeError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| SummarizeError::Malformed(format!("{e}: {}", truncate_for_log(body, 200))))?;

    let object = match &value {
        Value::Array(items) => items.first().and_then(Value::as_object),
        Value::Object(map) => Some(map),
        _ => None,
    };
    let Some(object) = object else {
        return Err(SummarizeError::Malformed(truncate_for_log(body, 200)));
    };

    if let Some(err) = object.get("error") {
        let message = err.as_str().map(str::to_string).unwrap_or_else(|| err.to_string());
        return Err(SummarizeError::Endpoint(message));
    }

    let summary = object
        .get("summary_text")
        .or_else(|| object.get("generated_text"))
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();

    if summary.is_empty() {
        return Err(SummarizeError::Malformed(truncate_for_log(body, 200)));
    }
    Ok(summary.to_string())
}

/// Wrapper that adds exponential backoff retry logic to any [`Summarize`]
/// implementation.
///
/// ```text
/// delay = min(base_delay * 2^(attempt-1), max_delay) + random_jitter(0..250ms)
/// ```
pub struct RetrySummarize<T> {
    /// The underlying summarizer to wrap.
    inner: T,
    /// Maximum number of retries after the first attempt.
    max_retries: usize,
    /// Initial delay between retries (doubles with each attempt).
    base_delay: StdDuration,
    /// Maximum delay cap.
    max_delay: StdDuration,
}

impl<T> RetrySummarize<T>
where
    T: Summarize,
{
    /// Wrap `inner`, allowing up to `max_retries` extra attempts.
    pub fn new(inner: T, max_retries: usize, base_delay: StdDuration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: StdDuration::from_secs(30),
        }
    }

    fn backoff(&self, attempt: usize) -> StdDuration {
        let shift = u32::try_from(attempt.saturating_sub(1)).unwrap_or(u32::MAX).min(16);
        let delay = self.base_delay.saturating_mul(1 << shift).min(self.max_delay);
        let jitter_ms: u64 = rng().random_range(0..=250);
        delay + StdDuration::from_millis(jitter_ms)
    }
}

impl<T> fmt::Debug for RetrySummarize<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetrySummarize")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Summarize for RetrySummarize<T>
where
    T: Summarize,
{
    #[instrument(level = "info", skip_all)]
    async fn summarize(&self, text: &str) -> Result<String, SummarizeError> {
        let total_t0 = Instant::now();
        let mut attempt = 0usize;

        loop {
            match self.inner.summarize(text).await {
                Ok(summary) => return Ok(summary),
                Err(e) => {
                    attempt += 1;
                    let total_dt = total_t0.elapsed();

                    if !e.is_transient() || attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            transient = e.is_transient(),
                            elapsed_ms_total = total_dt.as_millis(),
                            error = %e,
                            "summarize() giving up"
                        );
                        return Err(e);
                    }

                    let delay = self.backoff(attempt);
                    warn!(
                        attempt,
                        max = self.max_retries,
                        elapsed_ms_total = total_dt.as_millis(),
                        ?delay,
                        error = %e,
                        "summarize() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

/// Attach a summary to `article`, falling back to [`FALLBACK_SUMMARY`].
///
/// Articles without text are not sent to the endpoint.
#[instrument(level = "info", skip_all, fields(link = %article.link))]
pub async fn summarize_article<S: Summarize>(summarizer: &S, article: Article) -> SummarizedArticle {
    if article.raw_text.trim().is_empty() {
        warn!("Article has no text; using fallback summary");
        return SummarizedArticle {
            article,
            summary: FALLBACK_SUMMARY.to_string(),
            summarized: false,
        };
    }

    match summarizer.summarize(&article.raw_text).await {
        Ok(summary) => {
            info!(chars = summary.chars().count(), "Summarized article");
            SummarizedArticle {
                article,
                summary,
                summarized: true,
            }
        }
        Err(e) => {
            warn!(error = %e, "Summarization failed; using fallback summary");
            SummarizedArticle {
                article,
                summary: FALLBACK_SUMMARY.to_string(),
                summarized: false,
            }
        }
    }
}
