//! Frontmatter scanner for post files.
//!
//! A post file opens with a `---` line, continues with `key: value` lines and
//! closes with a second `---` line. Everything after that is the Markdown body.
//!
//! ```text
//! ---
//! title: "Hello"
//! date: 2024-01-01
//! cover_image: https://example.com/cover.png
//! ---
//! # Hi
//! ```
//!
//! The scanner makes one pass over the lines:
//!
//! ```text
//! BeforeFrontmatter ──`---`──▶ InFrontmatter ──`---`──▶ InBody
//!        │ blank lines             │ key: value            │ every line
//!        │ anything else ⇒ error   │                       │ kept verbatim
//! ```
//!
//! A scan that ends outside `InBody` never saw a closing delimiter and reports
//! [`ParseError::MetadataNotFound`], even when a metadata line was malformed
//! along the way.
//!
//! A value that itself contains `:` is only accepted for the URL-valued keys
//! (see [`URL_KEYS`]): `cover_image: https://x` splits into three parts, so the
//! line is re-read as `<key>:` followed by the whole remainder.

use super::markdown;
use thiserror::Error;

/// Delimiter line that opens and closes the frontmatter block.
pub const DELIMITER: &str = "---";

/// Keys whose values are URLs and may therefore contain the separator.
const URL_KEYS: &[&str] = &["author_image", "authorImg", "cover_image"];

/// Errors produced while scanning a post file.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("content is not valid UTF-8")]
    InvalidUtf8,

    #[error("metadata not found")]
    MetadataNotFound,

    #[error("line {line}: `{text}` is not a `key: value` pair")]
    MalformedLine { line: usize, text: String },

    #[error("required field `{0}` is missing")]
    MissingField(&'static str),

    #[error("title `{0}` must not contain a path separator")]
    InvalidTitle(String),
}

/// Position of the scanner relative to the frontmatter block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    BeforeFrontmatter,
    InFrontmatter,
    InBody,
}

/// Metadata recognized in a frontmatter block.
///
/// Optional fields stay `None` here; site-level defaults are applied later
/// when the [`Post`](super::Post) is assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: String,
    pub date: String,
    pub author: Option<String>,
    pub description: Option<String>,
    pub author_image: Option<String>,
    pub cover_image: Option<String>,
}

/// Result of parsing one post file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedDocument {
    pub meta: FrontMatter,
    /// Sanitized HTML rendered from the body section only.
    pub html: String,
}

/// Parse raw file bytes into metadata and rendered body.
///
/// Pure: the same bytes always produce the same document.
pub fn parse(bytes: &[u8]) -> Result<ParsedDocument, ParseError> {
    let text = std::str::from_utf8(bytes).map_err(|_| ParseError::InvalidUtf8)?;
    let (meta, body) = split(text)?;
    Ok(ParsedDocument {
        meta,
        html: markdown::render(&body),
    })
}

/// Scan `text` into frontmatter and the raw Markdown body.
pub fn split(text: &str) -> Result<(FrontMatter, String), ParseError> {
    let mut state = ScanState::BeforeFrontmatter;
    let mut meta = FrontMatter::default();
    let mut malformed = None;
    let mut body = Vec::new();

    let lines = text.split('\n').map(|line| line.strip_suffix('\r').unwrap_or(line));
    for (index, line) in lines.enumerate() {
        match state {
            ScanState::BeforeFrontmatter => {
                if line.trim().is_empty() {
                    continue;
                }
                if line != DELIMITER {
                    return Err(ParseError::MetadataNotFound);
                }
                state = ScanState::InFrontmatter;
            }
            ScanState::InFrontmatter => {
                if line == DELIMITER {
                    state = ScanState::InBody;
                } else if !line.trim().is_empty() && malformed.is_none() {
                    match split_line(line) {
                        Some((key, value)) => meta.apply(key, unquote(value)),
                        None => {
                            malformed = Some(ParseError::MalformedLine {
                                line: index + 1,
                                text: line.to_owned(),
                            });
                        }
                    }
                }
            }
            ScanState::InBody => body.push(line),
        }
    }

    if state != ScanState::InBody {
        return Err(ParseError::MetadataNotFound);
    }
    if let Some(err) = malformed {
        return Err(err);
    }
    meta.validate()?;

    Ok((meta, body.join("\n")))
}

/// Split a metadata line into a trimmed key and value.
///
/// Exactly one `:` splits plainly. More than one is only accepted for a URL
/// key whose value carries a scheme separator (`://`); the value is then the
/// text after the first `key:` prefix.
fn split_line(line: &str) -> Option<(&str, &str)> {
    let mut parts = line.split(':');
    let key = parts.next()?.trim();
    let rest = parts.next()?;

    if parts.next().is_none() {
        return Some((key, rest.trim()));
    }

    let (_, value) = line.split_once(':')?;
    (URL_KEYS.contains(&key) && value.contains("://")).then(|| (key, value.trim()))
}

/// Whether `key: value` written on one line reads back as the same pair.
pub fn accepts(key: &str, value: &str) -> bool {
    !value.contains(['\n', '\r'])
        && (!value.contains(':') || (URL_KEYS.contains(&key) && value.contains("://")))
}

/// Remove one matching pair of surrounding quotes.
fn unquote(value: &str) -> &str {
    ['"', '\'']
        .into_iter()
        .find_map(|q| value.strip_prefix(q)?.strip_suffix(q))
        .unwrap_or(value)
}

impl FrontMatter {
    /// Required fields are present and the title can name an output file.
    fn validate(&self) -> Result<(), ParseError> {
        if self.title.is_empty() {
            return Err(ParseError::MissingField("title"));
        }
        if self.date.is_empty() {
            return Err(ParseError::MissingField("date"));
        }
        if self.title.contains(['/', '\\']) {
            return Err(ParseError::InvalidTitle(self.title.clone()));
        }
        Ok(())
    }

    /// Store a recognized key; unknown keys are ignored.
    fn apply(&mut self, key: &str, value: &str) {
        let value = value.to_owned();
        match key {
            "title" => self.title = value,
            "date" => self.date = value,
            "author" => self.author = Some(value),
            "description" => self.description = Some(value),
            "author_image" | "authorImg" => self.author_image = Some(value),
            "cover_image" => self.cover_image = Some(value),
            _ => {}
        }
    }
}
