use std::io;
use std::path::Path;

use tracing::{debug, warn};

use crate::error::{JnError, Result};
use crate::read::extract::EntryFailure;
use crate::read::reader::{Chain, ChainEntry};
use crate::util::digest::DigestingWriter;

#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Entries whose digest was recomputed and matched.
    pub verified: u64,
    /// Entries stored without a digest.
    pub skipped: u64,
    pub failures: Vec<EntryFailure>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Recompute the digest of every entry that carries one, reading straight
/// from the fragments. Nothing is written to disk.
pub fn verify(archive: &Path) -> Result<VerifyReport> {
    let mut report = VerifyReport::default();
    for item in Chain::open(archive) {
        let item = item?;
        let Some(want) = item.entry.digest.as_deref() else {
            report.skipped += 1;
            continue;
        };
        match check_entry(&item, want) {
            Ok(()) => {
                debug!(path = %item.entry.path, "digest ok");
                report.verified += 1;
            }
            Err(e) => {
                warn!(path = %item.entry.path, error = %e, "verify failed");
                report.failures.push(EntryFailure {
                    path: item.entry.path.clone(),
                    error: e,
                });
            }
        }
    }
    Ok(report)
}

fn check_entry(item: &ChainEntry, want: &str) -> Result<()> {
    let mut content = item.open()?;
    let mut sink = DigestingWriter::new(io::sink(), true);
    let got = io::copy(&mut content, &mut sink).map_err(JnError::at(item.fragment().path()))?;
    if got != item.entry.length {
        return Err(JnError::Truncated {
            path: item.entry.path.clone(),
            expected: item.entry.length,
            got,
        });
    }
    let (_, have) = sink.finish();
    let have = have.unwrap_or_default();
    if !want.eq_ignore_ascii_case(&have) {
        return Err(JnError::DigestMismatch {
            path: item.entry.path.clone(),
            expected: want.to_string(),
            actual: have,
        });
    }
    Ok(())
}
