//! Markdown to HTML rendering for post bodies.
//!
//! Output is a sanitized fragment: raw HTML in the source is escaped rather
//! than passed through, and script-capable link schemes are neutralized.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// URL schemes that are never emitted as link or image targets.
const BLOCKED_SCHEMES: &[&str] = &["javascript:", "vbscript:", "data:"];

/// Render a Markdown body to a sanitized HTML fragment.
pub fn render(source: &str) -> String {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let events = Parser::new_ext(source, options).map(sanitize);

    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, events);
    out
}

fn sanitize(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        other => other,
    }
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let lowered = url.trim_start().to_ascii_lowercase();
    if BLOCKED_SCHEMES.iter().any(|scheme| lowered.starts_with(scheme)) {
        CowStr::Borrowed("#")
    } else {
        url
    }
}
