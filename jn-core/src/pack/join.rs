use std::ffi::OsString;
use std::path::{Path, PathBuf};

use time::OffsetDateTime;
use tracing::{info, warn};

use crate::container::layout::{EXTENSION, SIZE_LIMIT};
use crate::error::{JnError, Result};
use crate::pack::walker::{SourceFile, collect_sources};
use crate::pack::writer::{WriteOptions, WriterSession};

#[derive(Clone, Debug)]
pub struct JoinOptions {
    /// Record a BLAKE3 digest for every file.
    pub checksum: bool,
    /// User asked for split output. Fragmentation happens regardless; this
    /// only controls the announcement.
    pub split: bool,
    /// Content bytes allowed per fragment.
    pub size_limit: u64,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            checksum: false,
            split: false,
            size_limit: SIZE_LIMIT,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct JoinReport {
    /// Fragments in chain order; the first one is the container to hand to
    /// `extract`.
    pub fragments: Vec<PathBuf>,
    pub files: u64,
    pub bytes: u64,
}

/// Default container name used when no usable destination is given.
pub fn default_container_name(now: OffsetDateTime) -> String {
    let ms = now.unix_timestamp_nanos() / 1_000_000;
    format!("f-join-out-{ms}.{EXTENSION}")
}

/// Make `dest` end in `.jn`. A missing destination, or one that names a
/// directory rather than a file, gets a timestamped default name.
pub fn normalize_destination(dest: Option<&Path>, now: OffsetDateTime) -> PathBuf {
    let Some(dest) = dest else {
        return PathBuf::from(default_container_name(now));
    };
    let raw = dest.as_os_str().to_string_lossy();
    let names_dir = raw.ends_with('/') || raw.ends_with(std::path::MAIN_SEPARATOR);
    match dest.file_name() {
        Some(_) if !names_dir => {
            if dest.extension().is_some_and(|e| e == EXTENSION) {
                dest.to_path_buf()
            } else {
                let mut s: OsString = dest.as_os_str().to_owned();
                s.push(format!(".{EXTENSION}"));
                PathBuf::from(s)
            }
        }
        _ => dest.join(default_container_name(now)),
    }
}

/// Walk `inputs` and pack every regular file into a chain starting at the
/// normalized `dest`.
pub fn join(inputs: &[&Path], dest: Option<&Path>, opts: Option<&JoinOptions>) -> Result<JoinReport> {
    let opts = opts.cloned().unwrap_or_default();
    let first = normalize_destination(dest, OffsetDateTime::now_utc());
    if opts.split {
        info!(limit = opts.size_limit, "output will be split into fragments");
    }
    let files = collect_sources(inputs)?;
    info!(files = files.len(), out = %first.display(), "joining");
    join_files(&files, &first, &opts)
}

/// Pack an already enumerated file list into a chain whose first fragment is
/// `first`. Fails before creating anything if a file exceeds the budget.
pub fn join_files(files: &[SourceFile], first: &Path, opts: &JoinOptions) -> Result<JoinReport> {
    if let Some(big) = files.iter().find(|f| f.size > opts.size_limit) {
        return Err(JnError::FileTooLarge {
            path: big.path.clone(),
            size: big.size,
            limit: opts.size_limit,
        });
    }

    let mut session = WriterSession::create(
        first,
        WriteOptions {
            checksum: opts.checksum,
            size_limit: opts.size_limit,
        },
    )?;

    let mut bytes = 0u64;
    for (i, f) in files.iter().enumerate() {
        match session.append_file(&f.path, &f.rel, f.size) {
            Ok(entry) => bytes += entry.length,
            Err(e) => {
                warn!(file = %f.path.display(), error = %e, "join aborted");
                if let Err(seal) = session.finish() {
                    warn!(error = %seal, "could not seal active fragment");
                }
                return Err(e);
            }
        }
        info!("({}/{}) {}", i + 1, files.len(), f.rel);
    }

    let fragments = session.finish()?;
    Ok(JoinReport {
        fragments,
        files: files.len() as u64,
        bytes,
    })
}
