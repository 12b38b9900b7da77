//! Static asset mirroring into the output tree.

use super::error::BuildError;
use crate::log;
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Theme stylesheet, copied on its own into the output asset directory.
pub const STYLESHEET: &str = "style.css";

/// Copy every file directly inside `src` into `dest`.
///
/// Subdirectories are skipped. An existing file in `dest` is removed and
/// created fresh, never appended to. Returns the number of files copied.
pub fn mirror_dir(src: &Path, dest: &Path) -> Result<usize, BuildError> {
    if !src.is_dir() {
        return Err(BuildError::MissingDirectory {
            what: "asset",
            path: src.to_path_buf(),
        });
    }
    fs::create_dir_all(dest).map_err(BuildError::io(dest))?;

    let mut copied = 0;
    for entry in WalkDir::new(src).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|err| BuildError::Io {
            path: err.path().unwrap_or(src).to_path_buf(),
            source: err.into(),
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        replace_file(entry.path(), &dest.join(entry.file_name()))?;
        copied += 1;
    }
    Ok(copied)
}

/// Copy the theme's `style.css` into the output asset directory.
pub fn copy_stylesheet(theme_dir: &Path, dest: &Path) -> Result<(), BuildError> {
    let src = theme_dir.join(STYLESHEET);
    fs::create_dir_all(dest).map_err(BuildError::io(dest))?;
    replace_file(&src, &dest.join(STYLESHEET))?;
    log!("assets"; "{STYLESHEET}");
    Ok(())
}

/// Remove `dest` if present, then copy `src` to it.
fn replace_file(src: &Path, dest: &Path) -> Result<(), BuildError> {
    match fs::remove_file(dest) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(BuildError::io(dest)(err)),
    }
    fs::copy(src, dest).map_err(BuildError::io(src))?;
    Ok(())
}
