//! Build error types.

use crate::content::ParseError;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Class of a build failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required directory is missing; nothing was written.
    Configuration,
    /// A post file is malformed; previous output is untouched.
    Parse,
    /// A template failed to render.
    Render,
    /// A file could not be read, copied or written.
    Io,
}

impl ErrorKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Configuration => "configuration",
            Self::Parse => "parse",
            Self::Render => "render",
            Self::Io => "io",
        }
    }
}

/// Errors that abort a build.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("{what} directory missing: {}", path.display())]
    MissingDirectory { what: &'static str, path: PathBuf },

    #[error("failed to parse `{}`", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    #[error("failed to render `{template}`")]
    Render {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    #[error("IO error at `{}`", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingDirectory { .. } => ErrorKind::Configuration,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::Render { .. } => ErrorKind::Render,
            Self::Io { .. } => ErrorKind::Io,
        }
    }

    pub(crate) fn io(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_kind() {
        let err = BuildError::MissingDirectory {
            what: "theme",
            path: PathBuf::from("themes/default"),
        };
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert_eq!(err.to_string(), "theme directory missing: themes/default");

        let err = BuildError::Parse {
            path: PathBuf::from("posts/a.md"),
            source: ParseError::MetadataNotFound,
        };
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert_eq!(err.kind().label(), "parse");
        let chain = format!("{:#}", anyhow::Error::new(err));
        assert!(chain.contains("posts/a.md"));
        assert!(chain.contains("metadata not found"));
    }

    #[test]
    fn test_io_helper() {
        let err = BuildError::io(Path::new("public/index.html"))(std::io::Error::other("disk full"));
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(err.to_string().contains("public/index.html"));
    }
}
