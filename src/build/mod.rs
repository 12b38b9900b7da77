//! Site building orchestration.
//!
//! One call to [`build_site`] runs a fresh pass over the whole content tree:
//!
//! ```text
//! build_site()
//!     │
//!     ├── Validating   theme + content directories must exist
//!     ├── Preparing    create output/{posts,assets}, content/{posts,assets}
//!     ├── Parsing      every .md/.markdown in content/posts → Post (fail-fast)
//!     ├── Rendering    mirror assets, copy style.css, render pages, write
//!     └── Done
//! ```
//!
//! Nothing under `posts/` or `index.html` is written until every post has
//! parsed and every page has rendered, so a failed build leaves the previous
//! pages in place. The orchestrator keeps no state between calls.

pub mod assets;
pub mod error;
pub mod render;

pub use error::BuildError;

use crate::{
    config::SiteConfig,
    content::{self, Post},
    log,
    site::Site,
};
use rayon::prelude::*;
use render::{Page, Renderer};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Stage of a running build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Preparing,
    Parsing,
    Rendering,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Validating => "validating",
            Self::Preparing => "preparing",
            Self::Parsing => "parsing",
            Self::Rendering => "rendering",
            Self::Done => "done",
        })
    }
}

/// Summary of a successful build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub posts: usize,
    pub assets: usize,
}

/// Build the entire site into the configured output directory.
pub fn build_site(config: &SiteConfig) -> Result<BuildReport, BuildError> {
    let mut build = Build::new(config);
    build.run().inspect_err(|_| {
        log!("error"; "build failed while {}", build.stage);
    })
}

struct Build<'a> {
    config: &'a SiteConfig,
    stage: Stage,
}

impl<'a> Build<'a> {
    const fn new(config: &'a SiteConfig) -> Self {
        Self {
            config,
            stage: Stage::Validating,
        }
    }

    fn run(&mut self) -> Result<BuildReport, BuildError> {
        self.validate()?;

        self.stage = Stage::Preparing;
        self.prepare()?;

        self.stage = Stage::Parsing;
        let site = Site::new(self.config, self.parse_posts()?);
        if let Some(latest) = site.sorted_posts().first() {
            log!("parse"; "latest: {} ({})", latest.title, latest.date);
        }

        self.stage = Stage::Rendering;
        let assets = self.render(&site)?;

        self.stage = Stage::Done;
        log!("build"; "done: {} posts, {} assets", site.posts.len(), assets);
        Ok(BuildReport {
            posts: site.posts.len(),
            assets,
        })
    }

    fn validate(&self) -> Result<(), BuildError> {
        let required = [
            ("theme", self.config.theme_dir()),
            ("content", self.config.build.content.clone()),
        ];
        for (what, path) in required {
            if !path.is_dir() {
                return Err(BuildError::MissingDirectory { what, path });
            }
        }
        Ok(())
    }

    fn prepare(&self) -> Result<(), BuildError> {
        let config = self.config;
        for dir in [
            config.build.output.clone(),
            config.output_posts_dir(),
            config.output_assets_dir(),
            config.posts_dir(),
            config.assets_dir(),
        ] {
            fs::create_dir_all(&dir).map_err(BuildError::io(&dir))?;
        }
        Ok(())
    }

    fn parse_posts(&self) -> Result<Vec<Post>, BuildError> {
        let files = collect_post_files(&self.config.posts_dir())?;
        if files.is_empty() {
            log!("warn"; "no posts found in {}", self.config.posts_dir().display());
            return Ok(Vec::new());
        }

        let defaults = &self.config.base;
        let posts = files
            .par_iter()
            .map(|path| {
                let bytes = fs::read(path).map_err(BuildError::io(path))?;
                let doc = content::parse(&bytes).map_err(|source| BuildError::Parse {
                    path: path.clone(),
                    source,
                })?;
                Ok(Post::new(doc, defaults))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        log!("parse"; "{} posts", posts.len());
        Ok(posts)
    }

    /// Mirror assets, then render every page into memory before writing any.
    fn render(&self, site: &Site<'_>) -> Result<usize, BuildError> {
        let config = self.config;
        let output_assets = config.output_assets_dir();

        let mut assets = assets::mirror_dir(&config.assets_dir(), &output_assets)?;
        assets += assets::mirror_dir(&config.theme_assets_dir(), &output_assets)?;
        assets::copy_stylesheet(&config.theme_dir(), &output_assets)?;
        log!("assets"; "{assets} files mirrored");

        for link in site.link_collisions() {
            log!("warn"; "two posts share the output file posts/{link}; the later one wins");
        }

        let renderer = Renderer::new(&config.theme_dir());
        let mut pages = site
            .posts
            .par_iter()
            .map(|post| {
                Ok(Page {
                    path: format!("{}/{}", crate::config::POSTS_DIR, post.link),
                    html: renderer.render_post(site, post)?,
                })
            })
            .collect::<Result<Vec<_>, BuildError>>()?;
        pages.push(Page {
            path: render::INDEX_TEMPLATE.to_owned(),
            html: renderer.render_index(site)?,
        });

        for page in &pages {
            write_page(&config.build.output, page)?;
        }
        log!("render"; "{} pages", pages.len());

        Ok(assets)
    }
}

/// Post files directly inside `dir`, sorted by file name.
fn collect_post_files(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| BuildError::Io {
            path: dir.to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_file() && content::is_post_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn write_page(output: &Path, page: &Page) -> Result<(), BuildError> {
    let path = output.join(&page.path);
    fs::write(&path, &page.html).map_err(BuildError::io(&path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::ErrorKind;
    use tempfile::TempDir;

    const POST_TPL: &str = "<article><h2>{{ post.title }}</h2>{{ post.content|safe }}</article>";
    const INDEX_TPL: &str = "<h1>{{ site.title }}</h1><ul>\
        {% for p in posts|sort_by_date %}<li><a href=\"posts/{{ p.link }}\">{{ p.title }}</a></li>{% endfor %}\
        </ul>";

    /// Site root with the default layout and a minimal theme.
    fn site_root() -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let config = SiteConfig::with_root(dir.path());

        let theme = config.theme_dir();
        fs::create_dir_all(theme.join("assets")).unwrap();
        fs::write(theme.join("post.html"), POST_TPL).unwrap();
        fs::write(theme.join("index.html"), INDEX_TPL).unwrap();
        fs::write(theme.join("style.css"), "body { margin: 0 }").unwrap();
        fs::write(theme.join("assets/app.js"), "// app").unwrap();

        fs::create_dir_all(config.posts_dir()).unwrap();
        fs::create_dir_all(config.assets_dir()).unwrap();
        (dir, config)
    }

    fn write_post(config: &SiteConfig, name: &str, content: &str) {
        fs::write(config.posts_dir().join(name), content).unwrap();
    }

    fn read_output(config: &SiteConfig, rel: &str) -> String {
        fs::read_to_string(config.build.output.join(rel)).unwrap()
    }

    fn output_posts(config: &SiteConfig) -> Vec<String> {
        let mut names: Vec<_> = fs::read_dir(config.output_posts_dir())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_single_post_site() {
        let (_dir, config) = site_root();
        write_post(&config, "hello.md", "---\ntitle: Hello\ndate: 2024-01-01\n---\n# Hi\n");

        let report = build_site(&config).unwrap();
        assert_eq!(report.posts, 1);

        let post = read_output(&config, "posts/2024-01-01-Hello.html");
        assert!(post.contains("<h1>Hi</h1>"));
        assert!(!post.contains("date: 2024-01-01"));

        let index = read_output(&config, "index.html");
        assert!(index.contains(r#"<a href="posts/2024-01-01-Hello.html">Hello</a>"#));
    }

    #[test]
    fn test_index_lists_newest_first() {
        let (_dir, config) = site_root();
        write_post(&config, "a.md", "---\ntitle: Older\ndate: 2024-01-01\n---\nold\n");
        write_post(&config, "b.markdown", "---\ntitle: Newer\ndate: 2024-01-02\n---\nnew\n");

        build_site(&config).unwrap();

        let index = read_output(&config, "index.html");
        let newer = index.find("Newer").unwrap();
        let older = index.find("Older").unwrap();
        assert!(newer < older);
        assert_eq!(
            output_posts(&config),
            ["2024-01-01-Older.html", "2024-01-02-Newer.html"]
        );
    }

    #[test]
    fn test_missing_closing_delimiter_writes_no_posts() {
        let (_dir, config) = site_root();
        write_post(&config, "good.md", "---\ntitle: Good\ndate: 2024-01-01\n---\nok\n");
        write_post(&config, "bad.md", "---\ntitle: Bad\ndate: 2024-01-02\n# never closed\n");

        let err = build_site(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(
            err,
            BuildError::Parse {
                source: content::ParseError::MetadataNotFound,
                ..
            }
        ));
        assert!(output_posts(&config).is_empty());
        assert!(!config.build.output.join("index.html").exists());
    }

    #[test]
    fn test_title_with_slash_fails_before_assets() {
        let (_dir, config) = site_root();
        write_post(&config, "a.md", "---\ntitle: either/or\ndate: 2024-01-01\n---\n");

        let err = build_site(&config).unwrap_err();
        assert!(matches!(
            err,
            BuildError::Parse {
                source: content::ParseError::InvalidTitle(ref title),
                ..
            } if title == "either/or"
        ));
        assert!(output_posts(&config).is_empty());
        assert!(!config.output_assets_dir().join("app.js").exists());
    }

    #[test]
    fn test_failed_build_keeps_previous_output() {
        let (_dir, config) = site_root();
        write_post(&config, "a.md", "---\ntitle: Kept\ndate: 2024-01-01\n---\nv1\n");
        build_site(&config).unwrap();

        write_post(&config, "a.md", "---\ntitle: Kept\ndate: 2024-01-01\n---\nv2\n");
        write_post(&config, "broken.md", "no frontmatter here\n");
        assert!(build_site(&config).is_err());

        assert!(read_output(&config, "posts/2024-01-01-Kept.html").contains("v1"));
    }

    #[test]
    fn test_render_error_writes_no_pages() {
        let (_dir, config) = site_root();
        fs::write(config.theme_dir().join("index.html"), "{% for %}").unwrap();
        write_post(&config, "a.md", "---\ntitle: A\ndate: 2024-01-01\n---\n");

        let err = build_site(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Render);
        assert!(output_posts(&config).is_empty());
    }

    #[test]
    fn test_empty_posts_dir_is_valid() {
        let (_dir, config) = site_root();
        write_post(&config, "notes.txt", "not a post");

        let report = build_site(&config).unwrap();
        assert_eq!(report.posts, 0);
        assert!(read_output(&config, "index.html").contains("<ul></ul>"));
    }

    #[test]
    fn test_missing_theme_dir() {
        let (_dir, mut config) = site_root();
        config.build.theme = "absent".into();

        let err = build_site(&config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(matches!(err, BuildError::MissingDirectory { what: "theme", .. }));
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_missing_content_dir() {
        let (_dir, config) = site_root();
        fs::remove_dir_all(&config.build.content).unwrap();

        let err = build_site(&config).unwrap_err();
        assert!(matches!(err, BuildError::MissingDirectory { what: "content", .. }));
    }

    #[test]
    fn test_prepare_creates_content_subdirs() {
        let (_dir, config) = site_root();
        fs::remove_dir_all(config.posts_dir()).unwrap();
        fs::remove_dir_all(config.assets_dir()).unwrap();

        build_site(&config).unwrap();
        assert!(config.posts_dir().is_dir());
        assert!(config.assets_dir().is_dir());
    }

    #[test]
    fn test_assets_and_stylesheet_mirrored() {
        let (_dir, config) = site_root();
        fs::write(config.assets_dir().join("photo.jpg"), "jpg").unwrap();

        let report = build_site(&config).unwrap();
        assert_eq!(report.assets, 2);
        assert_eq!(read_output(&config, "assets/photo.jpg"), "jpg");
        assert_eq!(read_output(&config, "assets/app.js"), "// app");
        assert_eq!(read_output(&config, "assets/style.css"), "body { margin: 0 }");
    }

    #[test]
    fn test_builds_are_independent() {
        let (_dir, config) = site_root();
        write_post(&config, "a.md", "---\ntitle: A\ndate: 2024-01-01\n---\n");
        assert_eq!(build_site(&config).unwrap().posts, 1);

        fs::remove_file(config.posts_dir().join("a.md")).unwrap();
        assert_eq!(build_site(&config).unwrap().posts, 0);
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Parsing.to_string(), "parsing");
        assert_eq!(Stage::Done.to_string(), "done");
    }
}
