use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::mem;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::container::entry::Entry;
use crate::container::index::FragmentIndex;
use crate::container::layout::{PADDING, SIZE_LIMIT, fragment_base, fragment_file_name};
use crate::container::trailer::Trailer;
use crate::error::{JnError, Result};
use crate::util::digest::DigestingWriter;

#[derive(Clone, Debug)]
pub struct WriteOptions {
    /// Store a BLAKE3 digest per entry instead of the "NA" sentinel.
    pub checksum: bool,
    /// Content bytes allowed per fragment.
    pub size_limit: u64,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            checksum: false,
            size_limit: SIZE_LIMIT,
        }
    }
}

/// Append-only writer for one fragment file. Tracks the physical size so
/// entry offsets can be recorded without asking the filesystem.
pub struct FragmentWriter {
    path: PathBuf,
    out: BufWriter<File>,
    size: u64,
}

impl FragmentWriter {
    /// Create a new, empty fragment. Never overwrites an existing file.
    pub fn begin(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => JnError::AlreadyExists {
                    path: path.to_path_buf(),
                },
                _ => JnError::IoAt {
                    path: path.to_path_buf(),
                    source: e,
                },
            })?;
        info!(fragment = %path.display(), "fragment created");
        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            size: 0,
        })
    }

    /// Stream `src` into the fragment behind a separator and return the
    /// resulting entry. Offsets are relative to this fragment. A source longer
    /// than `declared` fails with [`JnError::SourceGrew`].
    pub fn append_file(
        &mut self,
        src: &Path,
        rel: &str,
        declared: u64,
        checksum: bool,
    ) -> Result<Entry> {
        let mut input = File::open(src).map_err(JnError::at(src))?;

        self.write_raw(PADDING)?;
        let start = self.size;

        let mut sink = DigestingWriter::new(&mut self.out, checksum);
        let copied = io::copy(&mut (&mut input).take(declared), &mut sink);
        // Count what reached the buffer even on failure so `size` stays exact.
        self.size += sink.written();
        let copied = copied.map_err(JnError::at(src))?;
        let (_, digest) = sink.finish();

        let mut extra = [0u8; 1];
        if input.read(&mut extra).map_err(JnError::at(src))? > 0 {
            return Err(JnError::SourceGrew {
                path: src.to_path_buf(),
                declared,
            });
        }
        if copied != declared {
            warn!(
                file = %src.display(),
                declared,
                copied,
                "source changed size while packing"
            );
        }
        debug!(path = rel, start, length = copied, "appended");
        Ok(Entry {
            path: rel.to_string(),
            size: declared,
            start,
            length: copied,
            digest,
        })
    }

    /// Write separator, index, separator and trailer, then flush and close.
    /// Returns the final fragment size.
    pub fn finalize(mut self, index: &FragmentIndex) -> Result<u64> {
        let body = index.encode()?;
        self.write_raw(PADDING)?;
        let index_offset = self.size;
        self.write_raw(&body)?;
        self.write_raw(PADDING)?;
        let trailer = Trailer { index_offset }.encode();
        self.write_raw(&trailer)?;
        self.out.flush().map_err(JnError::at(&self.path))?;
        info!(
            fragment = %self.path.display(),
            entries = index.entries.len(),
            size = self.size,
            "fragment sealed"
        );
        Ok(self.size)
    }

    fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.out.write_all(bytes).map_err(JnError::at(&self.path))?;
        self.size += bytes.len() as u64;
        Ok(())
    }
}

/// In-progress state of one join run: the active fragment, the entries it
/// has received so far and the chain built up to now.
pub struct WriterSession {
    dir: PathBuf,
    base_name: String,
    opts: WriteOptions,
    active: FragmentWriter,
    entries: Vec<Entry>,
    content: u64,
    seq: u32,
    fragments: Vec<PathBuf>,
}

impl WriterSession {
    /// Start a chain whose first fragment is `first`. Follow-up fragments are
    /// created next to it as `<base>-frag-NNNN.jn`.
    pub fn create(first: &Path, opts: WriteOptions) -> Result<Self> {
        let (dir, base_name) = fragment_base(first);
        let active = FragmentWriter::begin(first)?;
        Ok(Self {
            dir,
            base_name,
            opts,
            active,
            entries: Vec::new(),
            content: 0,
            seq: 0,
            fragments: vec![first.to_path_buf()],
        })
    }

    /// Append one source file, rolling over to a new fragment first when the
    /// file would push the active one past the budget.
    pub fn append_file(&mut self, src: &Path, rel: &str, declared: u64) -> Result<&Entry> {
        if declared > self.opts.size_limit {
            return Err(JnError::FileTooLarge {
                path: src.to_path_buf(),
                size: declared,
                limit: self.opts.size_limit,
            });
        }
        // Budget counts entry bytes only; framing lives in the reserve.
        if !self.entries.is_empty() && self.content + declared > self.opts.size_limit {
            self.roll_over()?;
        }
        let entry = self
            .active
            .append_file(src, rel, declared, self.opts.checksum)?;
        self.content += entry.length;
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    fn roll_over(&mut self) -> Result<()> {
        let seq = self.seq + 1;
        let name = fragment_file_name(&self.base_name, seq);
        let path = self.dir.join(&name);
        let next = FragmentWriter::begin(&path)?;

        let sealed = mem::replace(&mut self.active, next);
        let entries = mem::take(&mut self.entries);
        sealed.finalize(&FragmentIndex::linked(entries, name))?;

        self.seq = seq;
        self.content = 0;
        self.fragments.push(path);
        Ok(())
    }

    /// Seal the active fragment as the end of the chain.
    pub fn finish(self) -> Result<Vec<PathBuf>> {
        self.active.finalize(&FragmentIndex::terminal(self.entries))?;
        Ok(self.fragments)
    }
}
