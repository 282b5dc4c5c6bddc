use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom, Take};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::container::entry::Entry;
use crate::container::index::FragmentIndex;
use crate::container::layout::INDEX_RESERVE;
use crate::container::trailer::{IndexRegion, read_trailer_at_eof};
use crate::error::{JnError, Result};

/// One opened fragment: its trailer has been decoded and its index parsed.
#[derive(Debug)]
pub struct FragmentReader {
    path: PathBuf,
    region: IndexRegion,
    index: FragmentIndex,
}

impl FragmentReader {
    pub fn open(path: &Path) -> Result<Self> {
        let mut f = File::open(path).map_err(JnError::at(path))?;
        let region = read_trailer_at_eof(&mut f)?;

        if region.len > INDEX_RESERVE {
            return Err(JnError::CorruptIndex(format!(
                "index of {} bytes exceeds the {INDEX_RESERVE}-byte limit",
                region.len
            )));
        }
        f.seek(SeekFrom::Start(region.offset))?;
        let mut body = vec![0u8; region.len as usize];
        f.read_exact(&mut body)
            .map_err(|e| JnError::CorruptIndex(format!("index read: {e}")))?;
        let index = FragmentIndex::decode(&body)?;

        info!(
            fragment = %path.display(),
            entries = index.entries.len(),
            "fragment opened"
        );
        Ok(Self {
            path: path.to_path_buf(),
            region,
            index,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn index(&self) -> &FragmentIndex {
        &self.index
    }

    /// Byte offset where the index begins; entry content must end at or
    /// before it.
    pub fn data_end(&self) -> u64 {
        self.region.offset
    }

    /// Path of the next fragment, resolved next to this one.
    pub fn next_fragment(&self) -> Option<PathBuf> {
        let name = self.index.next_fragment.as_ref()?;
        let dir = self.path.parent().unwrap_or(Path::new(""));
        Some(dir.join(name))
    }

    /// Reader limited to `entry`'s content. The recorded range is checked
    /// against the data region first.
    pub fn open_entry(&self, entry: &Entry) -> Result<Take<File>> {
        let limit = self.data_end();
        match entry.end() {
            Some(end) if end <= limit => {}
            _ => {
                return Err(JnError::EntryOutOfBounds {
                    path: entry.path.clone(),
                    start: entry.start,
                    length: entry.length,
                    limit,
                });
            }
        }
        let mut f = File::open(&self.path).map_err(JnError::at(&self.path))?;
        f.seek(SeekFrom::Start(entry.start))
            .map_err(JnError::at(&self.path))?;
        Ok(f.take(entry.length))
    }
}

/// An entry yielded by [`Chain`], together with the fragment holding it.
#[derive(Clone, Debug)]
pub struct ChainEntry {
    pub entry: Entry,
    fragment: Arc<FragmentReader>,
}

impl ChainEntry {
    pub fn fragment(&self) -> &FragmentReader {
        &self.fragment
    }

    /// Byte source for this entry's content.
    pub fn open(&self) -> Result<Take<File>> {
        self.fragment.open_entry(&self.entry)
    }
}

/// Front-to-back walk over every entry of a fragment chain, following the
/// explicit `nextFragment` links. A fragment-level failure is yielded once
/// and ends the iteration.
pub struct Chain {
    pending: Option<PathBuf>,
    current: Option<Arc<FragmentReader>>,
    pos: usize,
    visited: HashSet<PathBuf>,
}

impl Chain {
    pub fn open(first: &Path) -> Self {
        Self {
            pending: Some(first.to_path_buf()),
            current: None,
            pos: 0,
            visited: HashSet::new(),
        }
    }

    fn load(&mut self, path: PathBuf) -> Result<()> {
        let key = fs::canonicalize(&path).map_err(JnError::at(&path))?;
        if !self.visited.insert(key) {
            return Err(JnError::Format(format!(
                "fragment chain loops back to {}",
                path.display()
            )));
        }
        let reader = FragmentReader::open(&path)?;
        self.pending = reader.next_fragment();
        if let Some(next) = &self.pending {
            debug!(next = %next.display(), "chain continues");
        }
        self.current = Some(Arc::new(reader));
        self.pos = 0;
        Ok(())
    }
}

impl Iterator for Chain {
    type Item = Result<ChainEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(frag) = &self.current {
                if let Some(entry) = frag.index().entries.get(self.pos) {
                    self.pos += 1;
                    return Some(Ok(ChainEntry {
                        entry: entry.clone(),
                        fragment: Arc::clone(frag),
                    }));
                }
                self.current = None;
            }
            let path = self.pending.take()?;
            if let Err(e) = self.load(path) {
                self.pending = None;
                return Some(Err(e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::layout::PADDING;
    use crate::container::trailer::Trailer;
    use std::io::Write;

    fn write_fragment(path: &Path, contents: &[(&str, &str)], next: Option<&str>) {
        let mut out = Vec::new();
        let mut entries = Vec::new();
        for (name, data) in contents {
            out.extend_from_slice(PADDING);
            entries.push(Entry {
                path: name.to_string(),
                size: data.len() as u64,
                start: out.len() as u64,
                length: data.len() as u64,
                digest: None,
            });
            out.extend_from_slice(data.as_bytes());
        }
        let index = match next {
            Some(n) => FragmentIndex::linked(entries, n.to_string()),
            None => FragmentIndex::terminal(entries),
        };
        out.extend_from_slice(PADDING);
        let offset = out.len() as u64;
        out.extend_from_slice(&index.encode().unwrap());
        out.extend_from_slice(PADDING);
        out.extend_from_slice(&Trailer { index_offset: offset }.encode());
        File::create(path).unwrap().write_all(&out).unwrap();
    }

    fn read_all(item: &ChainEntry) -> Vec<u8> {
        let mut buf = Vec::new();
        item.open().unwrap().read_to_end(&mut buf).unwrap();
        buf
    }

    #[test]
    fn follows_links_not_names() {
        let tmp = tempfile::tempdir().unwrap();
        // Lexical order of the file names disagrees with chain order.
        write_fragment(&tmp.path().join("a.jn"), &[("one", "1")], Some("z.jn"));
        write_fragment(&tmp.path().join("z.jn"), &[("two", "22")], Some("m.jn"));
        write_fragment(&tmp.path().join("m.jn"), &[("three", "333")], None);

        let items: Vec<_> = Chain::open(&tmp.path().join("a.jn"))
            .collect::<Result<_>>()
            .unwrap();
        let names: Vec<_> = items.iter().map(|i| i.entry.path.as_str()).collect();
        assert_eq!(names, ["one", "two", "three"]);
        assert_eq!(read_all(&items[2]), b"333");
    }

    #[test]
    fn detects_loops() {
        let tmp = tempfile::tempdir().unwrap();
        write_fragment(&tmp.path().join("a.jn"), &[("x", "x")], Some("b.jn"));
        write_fragment(&tmp.path().join("b.jn"), &[], Some("a.jn"));

        let results: Vec<_> = Chain::open(&tmp.path().join("a.jn")).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(JnError::Format(_))));
    }

    #[test]
    fn corrupt_index_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.jn");
        let mut out = PADDING.to_vec();
        let offset = out.len() as u64;
        out.extend_from_slice(b"{not json");
        out.extend_from_slice(PADDING);
        out.extend_from_slice(&Trailer { index_offset: offset }.encode());
        fs::write(&path, out).unwrap();

        let err = FragmentReader::open(&path).unwrap_err();
        assert!(matches!(err, JnError::CorruptIndex(_)));
    }

    #[test]
    fn oversized_index_region_is_refused() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("huge.jn");
        let f = File::create(&path).unwrap();
        // sparse: offset 0 puts every byte before the trailer in the index
        f.set_len(INDEX_RESERVE + 1000).unwrap();
        drop(f);
        let mut f = fs::OpenOptions::new().write(true).open(&path).unwrap();
        f.seek(SeekFrom::End(-(crate::container::trailer::TRAILER_LEN as i64)))
            .unwrap();
        f.write_all(&Trailer { index_offset: 0 }.encode()).unwrap();
        drop(f);

        let err = FragmentReader::open(&path).unwrap_err();
        assert!(matches!(err, JnError::CorruptIndex(_)));
    }

    #[test]
    fn garbage_trailer_is_a_format_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("junk.jn");
        fs::write(&path, vec![b'q'; 300]).unwrap();
        assert!(matches!(
            FragmentReader::open(&path),
            Err(JnError::Format(_))
        ));
    }

    #[test]
    fn out_of_range_entry_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("f.jn");
        write_fragment(&path, &[("ok", "fine")], None);
        let reader = FragmentReader::open(&path).unwrap();

        let mut bad = reader.index().entries[0].clone();
        bad.length = reader.data_end();
        assert!(matches!(
            reader.open_entry(&bad),
            Err(JnError::EntryOutOfBounds { .. })
        ));
        bad.start = u64::MAX;
        assert!(matches!(
            reader.open_entry(&bad),
            Err(JnError::EntryOutOfBounds { .. })
        ));
    }
}
