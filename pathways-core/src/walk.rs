//! Deterministic content tree traversal
//!
//! Both the validator and the checksum generator visit the same set of files
//! in the same order. Entries are sorted by file name at every directory
//! level before recursing, so repeated walks over an unchanged tree always
//! yield identical sequences.

use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::trace;
use walkdir::WalkDir;

use crate::error::{ContentError, Result};

/// Filters applied during traversal
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// File or directory names never visited
    pub exclude: BTreeSet<String>,
    /// Visit entries whose name starts with `.`
    pub include_hidden: bool,
    /// Relative paths (with `/` separators) skipped even though they match
    pub skip: BTreeSet<String>,
}

impl WalkOptions {
    fn admits(&self, name: &OsStr) -> bool {
        let name = name.to_string_lossy();
        if self.exclude.contains(name.as_ref()) {
            return false;
        }
        self.include_hidden || !name.starts_with('.')
    }
}

/// A regular file found under the content root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    /// Path on disk
    pub path: PathBuf,
    /// Path relative to the content root, `/`-separated
    pub relative: String,
}

impl ContentFile {
    /// Describe a file given explicitly, relative to `root` when it lives under it.
    pub fn from_path(root: &Path, path: &Path) -> Self {
        let relative = match path.strip_prefix(root) {
            Ok(rel) => relative_string(rel),
            Err(_) => match (root.canonicalize(), path.canonicalize()) {
                (Ok(root), Ok(path)) => path
                    .strip_prefix(&root)
                    .map(relative_string)
                    .unwrap_or_else(|_| path.display().to_string()),
                _ => path.display().to_string(),
            },
        };
        Self {
            path: path.to_path_buf(),
            relative,
        }
    }

    /// Lower-cased file extension
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    /// File name with the extension stripped
    pub fn stem(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
    }

    /// First directory component of the relative path, if any
    pub fn top_dir(&self) -> Option<&str> {
        let (first, _) = self.relative.split_once('/')?;
        Some(first)
    }

    /// Read the whole file.
    pub fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| ContentError::io(&self.path, e))
    }
}

/// Walk every regular file under `root`, handing each to `visit`.
///
/// The visitor returns `Ok(None)` to drop a file from the result and an
/// error to abort the walk. Traversal errors are fatal.
pub fn walk_files<T, F>(root: &Path, options: &WalkOptions, mut visit: F) -> Result<Vec<T>>
where
    F: FnMut(&ContentFile) -> Result<Option<T>>,
{
    if !root.is_dir() {
        return Err(ContentError::RootNotFound(root.to_path_buf()));
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || options.admits(entry.file_name()));

    let mut visited = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| {
            let path = source
                .path()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            ContentError::Walk { path, source }
        })?;

        if !entry.file_type().is_file() {
            continue;
        }

        let relative = relative_string(entry.path().strip_prefix(root).unwrap_or(entry.path()));
        if options.skip.contains(&relative) {
            trace!(file = %relative, "Skipping");
            continue;
        }

        let file = ContentFile {
            path: entry.into_path(),
            relative,
        };
        if let Some(item) = visit(&file)? {
            visited.push(item);
        }
    }

    Ok(visited)
}

fn relative_string(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
