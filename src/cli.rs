//! Command-line interface definitions for News Digest.
//!
//! Every option can also be supplied through the environment variable named
//! next to it, which is how the external scheduler normally configures a run.
//! Required values are declared optional here and checked in
//! [`crate::config::RunConfig::from_cli`], so a missing credential is reported
//! as a configuration error rather than a usage error.

use clap::Parser;

/// Command-line arguments for one digest run.
///
/// # Examples
///
/// ```sh
/// # Everything from the environment (or a .env file)
/// news_digest
///
/// # Custom feed catalog, print instead of sending
/// news_digest --feeds ./feeds.yaml --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Bearer token for the summarization endpoint
    #[arg(long, env = "HF_API_TOKEN", hide_env_values = true)]
    pub hf_api_token: Option<String>,

    /// SMTP username
    #[arg(long, env = "SMTP_USER")]
    pub smtp_user: Option<String>,

    /// SMTP password
    #[arg(long, env = "SMTP_PASS", hide_env_values = true)]
    pub smtp_pass: Option<String>,

    /// Recipient of the digest
    #[arg(long, env = "EMAIL_TO")]
    pub email_to: Option<String>,

    /// Sender address (defaults to the SMTP username)
    #[arg(long, env = "EMAIL_FROM")]
    pub email_from: Option<String>,

    /// SMTP relay host
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP relay port (465 implicit TLS, 587 STARTTLS, anything else plain)
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// Base URL of the inference API; the model id is appended
    #[arg(
        long,
        env = "HF_API_URL",
        default_value = "https://router.huggingface.co/hf-inference/models"
    )]
    pub hf_api_url: String,

    /// Summarization model id
    #[arg(
        long,
        env = "HF_SUMMARIZER_MODEL",
        default_value = "sshleifer/distilbart-cnn-12-6"
    )]
    pub model: String,

    /// Optional path to a YAML feed catalog (`Category: [url, ...]`)
    #[arg(long, env = "DIGEST_FEEDS")]
    pub feeds: Option<String>,

    /// Maximum articles taken per category
    #[arg(long, env = "DIGEST_MAX_PER_CATEGORY", default_value_t = 5)]
    pub max_per_category: usize,

    /// Character cap on text sent to the summarization endpoint
    #[arg(long, env = "DIGEST_MAX_INPUT_CHARS", default_value_t = 3000)]
    pub max_input_chars: usize,

    /// Extra attempts for transient summarization failures
    #[arg(long, env = "DIGEST_SUMMARY_RETRIES", default_value_t = 2)]
    pub summary_retries: usize,

    /// Timeout in seconds for each HTTP request
    #[arg(long, env = "DIGEST_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Pause between articles, in milliseconds
    #[arg(long, env = "DIGEST_PAUSE_MS", default_value_t = 1000)]
    pub pause_ms: u64,

    /// Use the feed's own text instead of downloading each article page
    #[arg(long, env = "DIGEST_FEED_TEXT_ONLY")]
    pub feed_text_only: bool,

    /// Print the digest to stdout instead of sending it
    #[arg(long, env = "DIGEST_DRY_RUN")]
    pub dry_run: bool,
}

#[cfg(test)]
impl Cli {
    /// Parse `args` with every environment fallback switched off, so results
    /// do not depend on the variables set in the calling shell.
    pub(crate) fn parse_without_env<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        use clap::{CommandFactory, FromArgMatches};

        let matches = Cli::command()
            .mut_args(|arg| arg.env(None::<&'static str>))
            .get_matches_from(args);
        Cli::from_arg_matches(&matches).expect("matches come from Cli::command")
    }
}
