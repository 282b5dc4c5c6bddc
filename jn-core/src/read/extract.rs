use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::{JnError, Result};
use crate::read::reader::{Chain, ChainEntry};
use crate::util::digest::DigestingWriter;

#[derive(Clone, Debug)]
pub struct ExtractOptions {
    /// Check stored digests while writing. Entries stored with "NA" are
    /// written unchecked either way.
    pub verify_digest: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            verify_digest: true,
        }
    }
}

/// One entry that could not be extracted.
#[derive(Debug)]
pub struct EntryFailure {
    pub path: String,
    pub error: JnError,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub extracted: u64,
    pub bytes: u64,
    pub failures: Vec<EntryFailure>,
}

/// Unpack the chain starting at `archive` into `dest`, creating it if needed.
/// Entry-level failures are collected in the report; trailer, index and
/// chain failures abort the run.
pub fn extract(archive: &Path, dest: &Path, opts: Option<&ExtractOptions>) -> Result<ExtractReport> {
    let opts = opts.cloned().unwrap_or_default();
    fs::create_dir_all(dest).map_err(JnError::at(dest))?;

    let mut report = ExtractReport::default();
    for item in Chain::open(archive) {
        let item = item?;
        match extract_entry(&item, dest, opts.verify_digest) {
            Ok(n) => {
                report.extracted += 1;
                report.bytes += n;
                debug!(path = %item.entry.path, bytes = n, "extracted");
            }
            Err(e) if e.is_entry_local() => {
                warn!(path = %item.entry.path, error = %e, "skipping entry");
                report.failures.push(EntryFailure {
                    path: item.entry.path.clone(),
                    error: e,
                });
            }
            Err(e) => return Err(e),
        }
    }
    info!(
        extracted = report.extracted,
        failed = report.failures.len(),
        dest = %dest.display(),
        "extraction finished"
    );
    Ok(report)
}

fn extract_entry(item: &ChainEntry, dest: &Path, verify: bool) -> Result<u64> {
    let entry = &item.entry;
    let out_path = safe_join(dest, &entry.path)?;
    if out_path.symlink_metadata().is_ok() {
        return Err(JnError::EntryAlreadyExists { path: out_path });
    }

    let mut content = item.open()?;
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent).map_err(JnError::at(parent))?;
    }
    let out = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&out_path)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => JnError::EntryAlreadyExists {
                path: out_path.clone(),
            },
            _ => JnError::IoAt {
                path: out_path.clone(),
                source: e,
            },
        })?;

    let expected = entry.digest.as_deref().filter(|_| verify);
    let mut sink = DigestingWriter::new(out, expected.is_some());
    let copied = io::copy(&mut content, &mut sink).map_err(JnError::at(&out_path));
    let (_, actual) = sink.finish();

    let failure = match copied {
        Err(e) => Some(e),
        Ok(got) if got != entry.length => Some(JnError::Truncated {
            path: entry.path.clone(),
            expected: entry.length,
            got,
        }),
        Ok(_) => match (expected, actual) {
            (Some(want), Some(have)) if !want.eq_ignore_ascii_case(&have) => {
                Some(JnError::DigestMismatch {
                    path: entry.path.clone(),
                    expected: want.to_string(),
                    actual: have,
                })
            }
            _ => None,
        },
    };
    if let Some(e) = failure {
        // partial output is removed
        let _ = fs::remove_file(&out_path);
        return Err(e);
    }
    Ok(entry.length)
}

/// Join an archived relative path onto `root`, refusing anything that could
/// land outside it.
pub fn safe_join(root: &Path, rel: &str) -> Result<PathBuf> {
    let p = Path::new(rel);
    if rel.is_empty() || !p.components().all(|c| matches!(c, Component::Normal(_))) {
        return Err(JnError::UnsafePath(rel.to_string()));
    }
    Ok(root.join(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_join_rejects_escapes() {
        let root = Path::new("/tmp/out");
        assert_eq!(
            safe_join(root, "pics/a.png").unwrap(),
            PathBuf::from("/tmp/out/pics/a.png")
        );
        for bad in ["", "/etc/passwd", "../x", "a/../../x", "./a"] {
            assert!(
                matches!(safe_join(root, bad), Err(JnError::UnsafePath(_))),
                "{bad} should be rejected"
            );
        }
    }
}
