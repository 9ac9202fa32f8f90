//! HTML alternative body for mail clients that prefer it.

use crate::models::SummarizedArticle;
use crate::utils::{html_escape, slugify_title};
use std::fmt::Write;

/// Render the HTML body. Every interpolated value is escaped.
pub fn render(date: &str, groups: &[(&str, Vec<&SummarizedArticle>)]) -> String {
    let total: usize = groups.iter().map(|(_, items)| items.len()).sum();

    let mut toc_html = String::new();
    let mut sections_html = String::new();
    for (category, items) in groups {
        let slug = slugify_title(category);
        let category = html_escape(category);
        let _ = writeln!(
            toc_html,
            r##"<li><a href="#{slug}">{category}</a> ({count})</li>"##,
            slug = slug,
            category = category,
            count = items.len(),
        );

        let _ = writeln!(
            sections_html,
            r#"<h2 id="{slug}" class="category">{category} <span class="count">({count} items)</span></h2>"#,
            slug = slug,
            category = category,
            count = items.len(),
        );
        for item in items {
            let class = if item.summarized { "summary" } else { "summary muted" };
            let _ = writeln!(
                sections_html,
                r#"<div class="entry">
  <h3><a href="{link}">{title}</a></h3>
  <p class="{class}">{summary}</p>
</div>"#,
                link = html_escape(&item.article.link),
                title = html_escape(&item.article.title),
                class = class,
                summary = html_escape(&item.summary),
            );
        }
    }

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  body {{ font-family: -apple-system, 'Segoe UI', Roboto, sans-serif; line-height: 1.5; color: #1f2937; max-width: 700px; margin: 0 auto; padding: 20px; }}
  h1 {{ font-size: 22px; margin-bottom: 4px; }}
  .category {{ border-bottom: 1px solid #e5e7eb; padding-bottom: 4px; margin-top: 28px; }}
  .count {{ color: #6b7280; font-size: 14px; font-weight: normal; }}
  .entry h3 {{ font-size: 16px; margin: 16px 0 4px 0; }}
  .entry a {{ color: #2563eb; text-decoration: none; }}
  .summary {{ margin: 0; }}
  .muted {{ color: #9ca3af; font-style: italic; }}
  .footer {{ color: #9ca3af; font-size: 12px; margin-top: 32px; }}
</style>
</head>
<body>
<h1>Daily News Digest</h1>
<div class="count">{date} &bull; {total} articles</div>
<ul>
{toc_html}</ul>
{sections_html}<p class="footer">End of digest.</p>
</body>
</html>
"#,
        date = html_escape(date),
        total = total,
        toc_html = toc_html,
        sections_html = sections_html,
    )
}
