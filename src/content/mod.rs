//! Content parsing: frontmatter, Markdown bodies and the post model.

pub mod frontmatter;
pub mod markdown;
pub mod post;

pub use frontmatter::{ParseError, parse};
pub use post::{Post, sort_by_date};

/// File extensions recognized as posts.
pub const POST_EXTENSIONS: &[&str] = &["md", "markdown"];

/// Whether `path` has a post extension.
pub fn is_post_file(path: &std::path::Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| POST_EXTENSIONS.contains(&ext))
}
