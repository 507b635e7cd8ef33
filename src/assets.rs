//! Static asset copy.
//!
//! Everything under the site's static directory is copied verbatim into
//! `{output}/static` on each build. Hidden files and directories are skipped.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },
    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Static files that a build would copy, relative to `src`.
pub fn list_static(src: &Path) -> Result<Vec<PathBuf>, AssetError> {
    if !src.is_dir() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(src)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
    {
        let entry = entry.map_err(|source| AssetError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() {
            let relative = entry.path().strip_prefix(src).unwrap_or(entry.path());
            files.push(relative.to_path_buf());
        }
    }
    Ok(files)
}

/// Copy the static tree into `dest`. A missing source directory copies
/// nothing. Returns the number of files copied.
pub fn copy_static(src: &Path, dest: &Path) -> Result<usize, AssetError> {
    let files = list_static(src)?;
    for relative in &files {
        let from = src.join(relative);
        let to = dest.join(relative);
        let copy = |from: &Path, to: &Path| -> io::Result<()> {
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(from, to).map(|_| ())
        };
        copy(&from, &to).map_err(|source| AssetError::Copy {
            from: from.clone(),
            to: to.clone(),
            source,
        })?;
    }
    if !files.is_empty() {
        tracing::debug!("copied {} static files to {}", files.len(), dest.display());
    }
    Ok(files.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn copies_nested_files() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("static");
        fs::create_dir_all(src.join("css")).unwrap();
        fs::write(src.join("css/site.css"), "body {}").unwrap();
        fs::write(src.join("robots.txt"), "User-agent: *").unwrap();

        let dest = tmp.path().join("out/static");
        assert_eq!(copy_static(&src, &dest).unwrap(), 2);
        assert_eq!(fs::read_to_string(dest.join("css/site.css")).unwrap(), "body {}");
        assert!(dest.join("robots.txt").exists());
    }

    #[test]
    fn skips_hidden_entries() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("static");
        fs::create_dir_all(src.join(".cache")).unwrap();
        fs::write(src.join(".cache/x"), "").unwrap();
        fs::write(src.join(".DS_Store"), "").unwrap();
        fs::write(src.join("app.js"), "").unwrap();

        assert_eq!(list_static(&src).unwrap(), vec![PathBuf::from("app.js")]);
    }

    #[test]
    fn missing_source_copies_nothing() {
        let tmp = TempDir::new().unwrap();
        let copied = copy_static(&tmp.path().join("absent"), &tmp.path().join("out")).unwrap();
        assert_eq!(copied, 0);
        assert!(!tmp.path().join("out").exists());
    }
}
