//! Site and post scaffolding.
//!
//! `init` creates a new site with the default configuration and the bundled
//! theme; `post` writes a new Markdown file with a frontmatter block.

use crate::{
    cli::PostArgs,
    config::{ASSETS_DIR, SiteConfig},
    content::frontmatter::{self, DELIMITER},
    log,
};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Bundled default theme: `(file name, contents)`.
const DEFAULT_THEME: &[(&str, &str)] = &[
    ("index.html", include_str!("embed/theme/index.html")),
    ("post.html", include_str!("embed/theme/post.html")),
    ("style.css", include_str!("embed/theme/style.css")),
];

/// Placeholder description for posts created without one.
const DESCRIPTION_PLACEHOLDER: &str = "Replace this with a short description of the post";

/// Body written below the frontmatter of a new post.
const POST_BODY: &str = "Your post content goes here!\n";

const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Site
// ============================================================================

/// Create a new site under `config.root`.
pub fn new_site(config: &SiteConfig) -> Result<()> {
    let root = &config.root;
    let theme_dir = config.theme_dir();

    init_site_structure(&[
        config.posts_dir(),
        config.assets_dir(),
        theme_dir.join(ASSETS_DIR),
    ])?;
    init_default_config(&config.config_path)?;
    init_default_theme(&theme_dir)?;

    log!("init"; "created site at {}", root.display());
    Ok(())
}

/// Write default configuration file
fn init_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&SiteConfig::default())?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Create site directory structure
fn init_site_structure(dirs: &[PathBuf]) -> Result<()> {
    for path in dirs {
        if path.exists() {
            bail!(
                "Path `{}` already exists. Try `penmark init <SITE_NAME>` instead.",
                path.display()
            );
        }
        fs::create_dir_all(path).with_context(|| format!("Failed to create {}", path.display()))?;
    }
    Ok(())
}

fn init_default_theme(theme_dir: &Path) -> Result<()> {
    for (name, content) in DEFAULT_THEME {
        let path = theme_dir.join(name);
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

// ============================================================================
// Post
// ============================================================================

/// Write a new post into the content posts directory. Returns its path.
pub fn new_post(config: &SiteConfig, args: &PostArgs) -> Result<PathBuf> {
    let title = args.title.trim();
    if title.is_empty() {
        bail!("Post title must not be empty.");
    }
    if title.contains(['/', '\\']) {
        bail!("Post title `{title}` must not contain path separators.");
    }

    let date = match &args.date {
        Some(date) => {
            NaiveDate::parse_from_str(date, DATE_FORMAT)
                .with_context(|| format!("Invalid date `{date}`, expected YYYY-MM-DD"))?;
            date.clone()
        }
        None => chrono::Local::now().format(DATE_FORMAT).to_string(),
    };

    let posts_dir = config.posts_dir();
    let path = posts_dir.join(post_file_name(&date, title));
    if path.exists() && !args.force {
        bail!(
            "Post `{}` already exists. Use --force to overwrite.",
            path.display()
        );
    }

    let content = frontmatter(&[
        ("title", title),
        ("date", date.as_str()),
        ("author", args.author.as_deref().unwrap_or(&config.base.author)),
        (
            "author_image",
            args.author_image
                .as_deref()
                .unwrap_or(&config.base.author_image),
        ),
        (
            "description",
            args.description.as_deref().unwrap_or(DESCRIPTION_PLACEHOLDER),
        ),
    ])?;

    fs::create_dir_all(&posts_dir)
        .with_context(|| format!("Failed to create {}", posts_dir.display()))?;
    fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    log!("init"; "created post `{title}` at {}", path.display());
    Ok(path)
}

/// `<date>-<title with spaces as underscores>.md`
fn post_file_name(date: &str, title: &str) -> String {
    format!("{date}-{}.md", title.replace(' ', "_"))
}

/// Render a frontmatter block followed by the placeholder body.
fn frontmatter(fields: &[(&str, &str)]) -> Result<String> {
    let mut out = format!("{DELIMITER}\n");
    for (key, value) in fields {
        if !frontmatter::accepts(key, value) {
            bail!("Value `{value}` for `{key}` cannot be written as a frontmatter line.");
        }
        out.push_str(key);
        out.push_str(": ");
        out.push_str(value);
        out.push('\n');
    }
    out.push_str(DELIMITER);
    out.push_str("\n\n");
    out.push_str(POST_BODY);
    Ok(out)
}
