use std::io::{Result, Write};

/// Write adapter that counts bytes and, when enabled, feeds them to a BLAKE3
/// hasher on the way through. One instance covers exactly one file; `finish`
/// consumes it so the digest is finalized once.
pub struct DigestingWriter<W: Write> {
    inner: W,
    hasher: Option<blake3::Hasher>,
    written: u64,
}

impl<W: Write> DigestingWriter<W> {
    pub fn new(inner: W, digest: bool) -> Self {
        Self {
            inner,
            hasher: digest.then(blake3::Hasher::new),
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Returns the inner writer and the lowercase hex digest, if enabled.
    pub fn finish(self) -> (W, Option<String>) {
        let digest = self.hasher.map(|h| hex::encode(h.finalize().as_bytes()));
        (self.inner, digest)
    }
}

impl<W: Write> Write for DigestingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let n = self.inner.write(buf)?;
        if let Some(h) = self.hasher.as_mut() {
            h.update(&buf[..n]);
        }
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        self.inner.flush()
    }
}

/// Hex digest of an in-memory buffer, same encoding as [`DigestingWriter`].
pub fn digest_hex(bytes: &[u8]) -> String {
    hex::encode(blake3::hash(bytes).as_bytes())
}
