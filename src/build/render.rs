//! Theme template rendering.
//!
//! A theme directory provides two templates:
//!
//! | Template     | Context                     | Output               |
//! |--------------|-----------------------------|----------------------|
//! | `post.html`  | `site`, `theme`, `post`     | `posts/<link>`       |
//! | `index.html` | `site`, `theme`, `posts`    | `index.html`         |
//!
//! Helpers available to theme authors:
//!
//! - `has_cover(value)`: true iff `value` is a non-empty string
//! - `sort_by_date(posts)`: newest first, stable (also usable as a filter)
//! - `now(format?)`: local time, `%Y-%m-%d %H:%M:%S` by default
//!
//! `post.content` is already HTML and must be emitted with `|safe`.

use super::error::BuildError;
use crate::{
    content::{Post, post::sort_by_date_key},
    site::Site,
};
use minijinja::{Environment, Value, context, path_loader};
use std::{fmt::Write, path::Path};

pub const POST_TEMPLATE: &str = "post.html";
pub const INDEX_TEMPLATE: &str = "index.html";

/// Default format for the `now()` helper.
const NOW_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A rendered page waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Path relative to the output directory.
    pub path: String,
    pub html: String,
}

/// Template environment bound to one theme directory.
pub struct Renderer {
    env: Environment<'static>,
}

impl Renderer {
    pub fn new(theme_dir: &Path) -> Self {
        let mut env = Environment::new();
        env.set_loader(path_loader(theme_dir));
        register_helpers(&mut env);
        Self { env }
    }

    /// Render the page for a single post.
    pub fn render_post(&self, site: &Site<'_>, post: &Post) -> Result<String, BuildError> {
        self.render(
            POST_TEMPLATE,
            context! {
                site => &site.config.base,
                theme => &site.config.build.theme,
                post => post,
            },
        )
    }

    /// Render the site index. Posts are passed in read order; themes sort
    /// them with `sort_by_date`.
    pub fn render_index(&self, site: &Site<'_>) -> Result<String, BuildError> {
        self.render(
            INDEX_TEMPLATE,
            context! {
                site => &site.config.base,
                theme => &site.config.build.theme,
                posts => &site.posts,
            },
        )
    }

    fn render(&self, name: &str, ctx: Value) -> Result<String, BuildError> {
        let to_error = |source| BuildError::Render {
            template: name.to_owned(),
            source,
        };
        self.env
            .get_template(name)
            .map_err(to_error)?
            .render(ctx)
            .map_err(to_error)
    }
}

fn register_helpers(env: &mut Environment<'static>) {
    env.add_function("has_cover", has_cover);
    env.add_function("sort_by_date", sort_by_date);
    env.add_filter("sort_by_date", sort_by_date);
    env.add_function("now", now);
}

fn has_cover(value: Value) -> bool {
    value.as_str().is_some_and(|s| !s.is_empty())
}

fn sort_by_date(posts: Vec<Value>) -> Vec<Value> {
    let mut posts = posts;
    sort_by_date_key(&mut posts, |post| {
        post.get_attr("date")
            .ok()
            .and_then(|date| date.as_str().map(str::to_owned))
            .unwrap_or_default()
    });
    posts
}

/// Local time in a strftime `format`. An unknown specifier is a render error.
fn now(format: Option<String>) -> Result<String, minijinja::Error> {
    let format = format.as_deref().unwrap_or(NOW_FORMAT);
    let mut out = String::new();
    write!(out, "{}", chrono::Local::now().format(format)).map_err(|_| {
        minijinja::Error::new(
            minijinja::ErrorKind::InvalidOperation,
            format!("invalid time format `{format}`"),
        )
    })?;
    Ok(out)
}
