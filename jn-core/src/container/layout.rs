//! Fixed constants of the fragment layout:
//!
//! ```text
//! [PADDING] entry_1 [PADDING] entry_2 ... [PADDING] INDEX_JSON [PADDING] TRAILER
//! ```
//!
//! The separator is only a visual marker. Readers resolve every region from
//! the trailer offset and the recorded entry ranges.

use std::path::{Path, PathBuf};

pub const PADDING: &[u8] = b"\n$$$$$$$$$$$$$$$$$$$$$$$\n";
pub const PADDING_LEN: u64 = PADDING.len() as u64;

/// Canonical container suffix (without the dot).
pub const EXTENSION: &str = "jn";

/// Room kept per fragment for separators, index and trailer. Also the
/// largest index a reader will load.
pub const INDEX_RESERVE: u64 = 40 * 1000 * 1000;

/// Per-fragment content budget: 4 GB minus [`INDEX_RESERVE`].
pub const SIZE_LIMIT: u64 = 4 * 1000 * 1000 * 1000 - INDEX_RESERVE;

/// Bare file name of the `seq`-th follow-up fragment (`seq` starts at 1).
pub fn fragment_file_name(base_name: &str, seq: u32) -> String {
    format!("{base_name}-frag-{seq:04}.{EXTENSION}")
}

/// Split a first-fragment path into its directory and base name (extension
/// stripped), e.g. `out/pics.jn` -> (`out`, `pics`).
pub fn fragment_base(first: &Path) -> (PathBuf, String) {
    let dir = first
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    let name = first
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let base = name
        .strip_suffix(&format!(".{EXTENSION}"))
        .map(str::to_string)
        .unwrap_or(name);
    (dir, base)
}

/// A `nextFragment` value must name a sibling file, never a path.
pub fn is_bare_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_is_25_bytes() {
        assert_eq!(PADDING_LEN, 25);
        assert!(PADDING.starts_with(b"\n$") && PADDING.ends_with(b"$\n"));
    }

    #[test]
    fn fragment_names_are_zero_padded() {
        assert_eq!(fragment_file_name("pics", 1), "pics-frag-0001.jn");
        assert_eq!(fragment_file_name("pics", 42), "pics-frag-0042.jn");
        assert_eq!(fragment_file_name("pics", 12345), "pics-frag-12345.jn");
    }

    #[test]
    fn base_strips_extension_once() {
        let (dir, base) = fragment_base(Path::new("out/pics.jn"));
        assert_eq!(dir, PathBuf::from("out"));
        assert_eq!(base, "pics");

        let (dir, base) = fragment_base(Path::new("a.jn.jn"));
        assert_eq!(dir, PathBuf::from(""));
        assert_eq!(base, "a.jn");
    }

    #[test]
    fn bare_names() {
        assert!(is_bare_name("x-frag-0001.jn"));
        assert!(!is_bare_name("../x.jn"));
        assert!(!is_bare_name("dir/x.jn"));
        assert!(!is_bare_name(""));
    }
}
