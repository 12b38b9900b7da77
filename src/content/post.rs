//! Post model: one parsed content document plus its derived output link.

use super::frontmatter::ParsedDocument;
use crate::config::BaseConfig;
use serde::Serialize;
use std::cmp::Reverse;

/// One post, as seen by templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Post {
    pub title: String,
    pub author: String,
    pub author_image: String,
    pub description: String,
    /// Empty when the post has no cover image.
    pub cover_image: String,
    /// Publication date, canonically `YYYY-MM-DD`.
    pub date: String,
    /// Output filename under `posts/`.
    pub link: String,
    /// Sanitized HTML body.
    pub content: String,
}

impl Post {
    /// Build a post from a parsed document, backfilling author fields from
    /// the site defaults when the frontmatter leaves them empty.
    pub fn new(doc: ParsedDocument, defaults: &BaseConfig) -> Self {
        let meta = doc.meta;
        let link = link_for(&meta.date, &meta.title);
        Self {
            author: non_empty_or(meta.author, &defaults.author),
            author_image: non_empty_or(meta.author_image, &defaults.author_image),
            description: meta.description.unwrap_or_default(),
            cover_image: meta.cover_image.unwrap_or_default(),
            title: meta.title,
            date: meta.date,
            link,
            content: doc.html,
        }
    }
}

/// Output filename for a post: `<date>-<title with spaces as underscores>.html`.
///
/// Two posts with the same date and title map to the same file.
pub fn link_for(date: &str, title: &str) -> String {
    format!("{date}-{}.html", title.replace(' ', "_"))
}

/// Sort posts newest first by their date string.
///
/// The sort is stable, so posts sharing a date keep their relative order.
pub fn sort_by_date(posts: &mut [Post]) {
    posts.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Keyed variant of [`sort_by_date`] for any item that exposes a date.
pub fn sort_by_date_key<T>(items: &mut [T], date: impl Fn(&T) -> String) {
    items.sort_by_cached_key(|item| Reverse(date(item)));
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_owned())
}
