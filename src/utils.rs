//! String helpers shared by the fetcher, summarizer, and composer.
//!
//! - Character-safe truncation for payload caps and log previews
//! - HTML stripping and whitespace normalization for feed bodies
//! - Escaping and slugs for the HTML digest

use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html};

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));

/// Today's local date as `YYYY-MM-DD`.
pub fn local_date() -> String {
    Local::now().date_naive().to_string()
}

/// Keep at most `max` characters of `s`, never splitting a character.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// Truncate a string for logging purposes.
///
/// Strings longer than `max` characters are cut and suffixed with
/// `"…(+N bytes)"`, N being the number of bytes dropped.
pub fn truncate_for_log(s: &str, max: usize) -> String {
    let kept = truncate_chars(s, max);
    if kept.len() == s.len() {
        s.to_string()
    } else {
        format!("{}…(+{} bytes)", kept, s.len() - kept.len())
    }
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE.replace_all(s.trim(), " ").into_owned()
}

/// Elements that start a new line of text when rendered.
const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "br", "dd", "div", "dl", "dt", "figcaption",
    "figure", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "hr", "li", "main", "nav",
    "ol", "p", "pre", "section", "table", "td", "th", "tr", "ul",
];

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
        } else if let Some(child) = ElementRef::wrap(child) {
            let block = BLOCK_TAGS.contains(&child.value().name());
            if block {
                out.push(' ');
            }
            push_text(child, out);
            if block {
                out.push(' ');
            }
        }
    }
}

/// Visible text of `element`, whitespace collapsed.
///
/// Inline markup joins its text to the neighbours (`<b>Q</b>uick` is
/// "Quick"); block elements are separated by a space.
pub fn element_text(element: ElementRef<'_>) -> String {
    let mut text = String::new();
    push_text(element, &mut text);
    collapse_whitespace(&text)
}

/// Reduce an HTML fragment to its visible text.
pub fn strip_html(fragment: &str) -> String {
    element_text(Html::parse_fragment(fragment).root_element())
}

/// Escape text for inclusion in HTML element content or attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Convert a heading to an anchor-friendly slug.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(slugify_title("Global-Politics"), "global-politics");
/// ```
pub fn slugify_title(title: &str) -> String {
    title
        .to_lowercase()
        .replace(|c: char| !c.is_alphanumeric() && c != ' ' && c != '-', "")
        .replace(' ', "-")
}
