use std::path::PathBuf;

use jn_core::error::Result;
use jn_core::{ExtractOptions, JoinOptions, NO_DIGEST, extract, join, list, verify};
use time::OffsetDateTime;
use tracing::{info, warn};

/// With more than one path the last one is the destination.
fn split_destination(mut paths: Vec<PathBuf>) -> (Vec<PathBuf>, Option<PathBuf>) {
    let dest = if paths.len() > 1 { paths.pop() } else { None };
    (paths, dest)
}

fn default_extract_dir() -> PathBuf {
    let ms = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    PathBuf::from(format!("EXTRACT-{ms}"))
}

pub fn handle_join(paths: Vec<PathBuf>, checksum: bool, split: bool) -> Result<bool> {
    let (inputs, dest) = split_destination(paths);
    let refs: Vec<_> = inputs.iter().map(|p| p.as_path()).collect();
    let opts = JoinOptions {
        checksum,
        split,
        ..Default::default()
    };
    let report = join(&refs, dest.as_deref(), Some(&opts))?;
    for frag in &report.fragments {
        println!("{}", frag.display());
    }
    info!(
        files = report.files,
        bytes = report.bytes,
        fragments = report.fragments.len(),
        "join complete"
    );
    Ok(true)
}

pub fn handle_extract(archive: PathBuf, dest: Option<PathBuf>, no_verify: bool) -> Result<bool> {
    let dest = dest.unwrap_or_else(default_extract_dir);
    let opts = ExtractOptions {
        verify_digest: !no_verify,
    };
    let report = extract(&archive, &dest, Some(&opts))?;
    for f in &report.failures {
        warn!(entry = %f.path, error = %f.error, "skipped");
    }
    info!(
        extracted = report.extracted,
        bytes = report.bytes,
        dest = %dest.display(),
        skipped = report.failures.len(),
        "extract complete"
    );
    Ok(report.failures.is_empty())
}

pub fn handle_list(archive: PathBuf) -> Result<bool> {
    for l in list(&archive)? {
        let e = &l.entry;
        println!(
            "{}  {} bytes  off={}  {}  [{}]",
            e.path,
            e.size,
            e.start,
            e.digest.as_deref().unwrap_or(NO_DIGEST),
            l.fragment
        );
    }
    Ok(true)
}

pub fn handle_verify(archive: PathBuf) -> Result<bool> {
    let report = verify(&archive)?;
    for f in &report.failures {
        warn!(entry = %f.path, error = %f.error, "verification failed");
    }
    info!(
        ok = report.verified,
        without_digest = report.skipped,
        failed = report.failures.len(),
        "verify complete"
    );
    Ok(report.is_ok())
}
