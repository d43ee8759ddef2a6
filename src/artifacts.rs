//! Writing generated code into the workspace
//!
//! Content goes to a temp file in the target directory first and is then
//! renamed into place, so a failed write never leaves a partial file and the
//! temp file is removed on every error path.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{Error, Result};

/// Suffixes tried before giving up on a free name
const MAX_SUFFIX: u32 = 999;

/// Write `contents` under a name derived from `filename` that doesn't exist yet
///
/// `main.py` becomes `main_2.py`, `main_3.py` and so on when taken.
///
/// # Errors
///
/// Returns error if the directory can't be written or no free name is left
pub fn write_new(dir: &Path, filename: &str, contents: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let mut tmp = staged(dir, contents)?;

    let (stem, extension) = split_name(filename);
    for n in 1..=MAX_SUFFIX {
        let candidate = dir.join(numbered(stem, extension, n));
        match tmp.persist_noclobber(&candidate) {
            Ok(_) => {
                tracing::info!(path = %candidate.display(), "saved generated code");
                return Ok(candidate);
            }
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => tmp = e.file,
            Err(e) => return Err(e.error.into()),
        }
    }

    Err(Error::Workspace(format!(
        "no free file name for {filename} in {}",
        dir.display()
    )))
}

/// Replace the contents of `path` atomically
///
/// # Errors
///
/// Returns error if the file can't be written
pub fn rewrite(path: &Path, contents: &str) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let tmp = staged(dir, contents)?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    tracing::debug!(path = %path.display(), "updated generated code");
    Ok(())
}

fn staged(dir: &Path, contents: &str) -> Result<NamedTempFile> {
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents.as_bytes())?;
    tmp.flush()?;
    Ok(tmp)
}

fn split_name(filename: &str) -> (&str, Option<&str>) {
    match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (filename, None),
    }
}

fn numbered(stem: &str, extension: Option<&str>, n: u32) -> String {
    let stem = if n == 1 {
        stem.to_string()
    } else {
        format!("{stem}_{n}")
    };
    match extension {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}
