use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{JnError, Result};

/// One regular file discovered under a source root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Archived path: relative to the root's parent, slash-separated.
    pub rel: String,
    /// Size at enumeration time.
    pub size: u64,
}

/// Enumerate regular files under every root, in root order. Within a root the
/// walk is sorted by file name so an unchanged tree always yields the same list.
/// Directories are descended, symlinks are skipped.
pub fn collect_sources(roots: &[&Path]) -> Result<Vec<SourceFile>> {
    let mut files = Vec::new();
    for root in roots {
        let root = fs::canonicalize(root).map_err(JnError::at(*root))?;
        let anchor = root.parent().unwrap_or(root.as_path()).to_path_buf();
        let before = files.len();

        for e in WalkDir::new(&root).follow_links(false).sort_by_file_name() {
            let e = e?;
            if !e.file_type().is_file() {
                if e.file_type().is_symlink() {
                    debug!(path = %e.path().display(), "skipping symlink");
                }
                continue;
            }
            let size = e.metadata()?.len();
            let rel = rel_path(e.path(), &anchor)?;
            files.push(SourceFile {
                path: e.path().to_path_buf(),
                rel,
                size,
            });
        }
        debug!(root = %root.display(), files = files.len() - before, "enumerated source");
    }
    Ok(files)
}

fn rel_path(path: &Path, anchor: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(anchor)
        .map_err(|_| JnError::UnsafePath(path.display().to_string()))?;
    let mut parts = Vec::new();
    for c in rel.components() {
        match c {
            Component::Normal(s) => {
                let part = s.to_string_lossy();
                if s.to_str().is_none() {
                    warn!(path = %path.display(), "non UTF-8 file name stored lossily");
                }
                parts.push(part.into_owned());
            }
            _ => return Err(JnError::UnsafePath(path.display().to_string())),
        }
    }
    Ok(parts.join("/"))
}
