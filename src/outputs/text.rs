//! Plain-text digest body.

use crate::models::SummarizedArticle;
use std::fmt::Write;

/// Render the plain-text body.
///
/// ```text
/// Daily News Digest — 2025-05-06
///
/// --- IT (1 items) ---
///
/// Title
/// Summary
/// Link: https://...
///
/// End of digest.
/// ```
pub fn render(date: &str, groups: &[(&str, Vec<&SummarizedArticle>)]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Daily News Digest — {date}\n");

    for (category, items) in groups {
        let _ = writeln!(out, "--- {category} ({} items) ---\n", items.len());
        for item in items {
            let _ = writeln!(
                out,
                "{}\n{}\nLink: {}\n",
                item.article.title, item.summary, item.article.link
            );
        }
    }

    out.push_str("End of digest.\n");
    out
}
