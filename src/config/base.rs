//! `[base]` section configuration.
//!
//! Site-wide information handed to every template, plus the defaults that
//! posts fall back to when their frontmatter leaves a field empty.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in penmark.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Blog"
/// author = "Alice"
/// author_image = "https://example.com/alice.png"
/// description = "Notes on Rust"
///
/// [base.social]
/// github = "https://github.com/alice"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title displayed in browser tab and headers.
    #[serde(default = "defaults::base::title")]
    #[educe(Default = defaults::base::title())]
    pub title: String,

    /// Default author for posts that do not name one.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Default author avatar (URL or site-relative path).
    #[serde(default = "defaults::base::author_image")]
    #[educe(Default = defaults::base::author_image())]
    pub author_image: String,

    /// Site description for the index page and meta tags.
    #[serde(default = "defaults::base::description")]
    #[educe(Default = defaults::base::description())]
    pub description: String,

    /// Favicon reference, empty when the theme provides its own.
    #[serde(default)]
    pub favicon: String,

    #[serde(default)]
    pub social: SocialLinks,
}

/// `[base.social]` - profile links rendered by the theme.
///
/// Empty strings mean "not set"; themes are expected to skip them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocialLinks {
    pub github: String,
    pub linkedin: String,
    pub email: String,
}
