//! Digest composition.
//!
//! Turns the run's ordered [`SummarizedArticle`]s into a [`Digest`] holding a
//! plain-text body and an HTML alternative. Composition is a pure function of
//! the date, the catalog's categories, and the article sequence: the same
//! input always renders to the same bytes.
//!
//! # Submodules
//!
//! - [`text`]: the plain-text body
//! - [`html`]: the HTML body
//!
//! Every catalog category gets a section in catalog order, including
//! categories that produced no articles; within a section articles keep their
//! input order.

pub mod html;
pub mod text;

use crate::models::{Digest, SummarizedArticle};
use itertools::Itertools;

/// Subject line for the digest sent on `date`.
pub fn subject(date: &str) -> String {
    format!("Daily Digest — {date}")
}

/// Group articles under `categories`, in that order.
///
/// Each listed category yields a group even when it has no articles, so a
/// category whose feeds all failed still shows up as `(0 items)`. Articles
/// filed under an unlisted category follow in first-appearance order.
pub fn group_by_category<'a>(
    categories: &[&'a str],
    articles: &'a [SummarizedArticle],
) -> Vec<(&'a str, Vec<&'a SummarizedArticle>)> {
    categories
        .iter()
        .copied()
        .chain(articles.iter().map(|a| a.article.category.as_str()))
        .unique()
        .map(|category| {
            let members = articles
                .iter()
                .filter(|a| a.article.category == category)
                .collect();
            (category, members)
        })
        .collect()
}

/// Render the digest for `date` from `articles`, one section per category.
pub fn compose_digest(
    date: &str,
    categories: &[&str],
    articles: Vec<SummarizedArticle>,
) -> Digest {
    let groups = group_by_category(categories, &articles);
    let text_body = text::render(date, &groups);
    let html_body = html::render(date, &groups);

    Digest {
        date: date.to_string(),
        subject: subject(date),
        text_body,
        html_body,
        articles,
    }
}
