use std::io::{Read, Seek, SeekFrom};

use super::layout::PADDING_LEN;
use crate::error::{JnError, Result};

pub const TRAILER_LEN: u64 = 128;
pub const FILLER: u8 = b'$';

// Written ahead of the digits so the offset sits on its own line when the
// fragment tail is viewed as text.
const LEAD: &[u8] = b"\n$$$$$$$$";

/// Fixed-size block at the very end of a fragment holding the ASCII decimal
/// offset at which the index JSON begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Trailer {
    pub index_offset: u64,
}

impl Trailer {
    pub fn encode(self) -> [u8; TRAILER_LEN as usize] {
        let mut block = [FILLER; TRAILER_LEN as usize];
        let digits = self.index_offset.to_string();
        let at = LEAD.len();
        block[..at].copy_from_slice(LEAD);
        block[at..at + digits.len()].copy_from_slice(digits.as_bytes());
        block
    }

    pub fn decode(block: &[u8]) -> Result<Self> {
        if block.len() as u64 != TRAILER_LEN {
            return Err(JnError::Format(format!(
                "trailer must be {TRAILER_LEN} bytes, got {}",
                block.len()
            )));
        }
        let text = std::str::from_utf8(block)
            .map_err(|_| JnError::Format("trailer is not ASCII".into()))?;
        let digits =
            text.trim_matches(|c: char| c == FILLER as char || c.is_ascii_whitespace());
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(JnError::Format(format!(
                "trailer does not hold an offset: {digits:?}"
            )));
        }
        let index_offset = digits
            .parse::<u64>()
            .map_err(|e| JnError::Format(format!("trailer offset: {e}")))?;
        Ok(Self { index_offset })
    }
}

/// Where the index lives inside one fragment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexRegion {
    pub offset: u64,
    pub len: u64,
    pub fragment_len: u64,
}

/// Read the last 128 bytes of a fragment and derive the index region from
/// them. The index is followed by exactly one separator and the trailer.
pub fn read_trailer_at_eof<F: Read + Seek>(f: &mut F) -> Result<IndexRegion> {
    let fragment_len = f.seek(SeekFrom::End(0))?;
    if fragment_len < TRAILER_LEN {
        return Err(JnError::Format(format!(
            "fragment too small for trailer ({fragment_len} bytes)"
        )));
    }
    f.seek(SeekFrom::End(-(TRAILER_LEN as i64)))?;
    let mut block = [0u8; TRAILER_LEN as usize];
    f.read_exact(&mut block)?;
    let trailer = Trailer::decode(&block)?;

    let len = fragment_len
        .checked_sub(TRAILER_LEN + PADDING_LEN)
        .and_then(|end| end.checked_sub(trailer.index_offset))
        .ok_or_else(|| {
            JnError::Format(format!(
                "index offset {} lies past the end of a {fragment_len}-byte fragment",
                trailer.index_offset
            ))
        })?;
    Ok(IndexRegion {
        offset: trailer.index_offset,
        len,
        fragment_len,
    })
}
