//! `[build]` section configuration.
//!
//! Paths are written relative to the site root in penmark.toml and are
//! resolved to absolute paths once the root is known.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in penmark.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// theme = "default"     # Subdirectory of `themes`
/// themes = "themes"     # Directory holding all themes
/// content = "content"   # Holds `posts/` and `assets/`
/// output = "public"     # Generated site
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Name of the active theme.
    #[serde(default = "defaults::build::theme")]
    #[educe(Default = defaults::build::theme())]
    pub theme: String,

    /// Directory holding themes, one subdirectory per theme.
    #[serde(default = "defaults::build::themes")]
    #[educe(Default = defaults::build::themes())]
    pub themes: PathBuf,

    /// Content directory (`posts/` and `assets/` live below it).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Output directory for the generated site.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,
}
