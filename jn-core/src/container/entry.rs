use serde::{Deserialize, Serialize};

/// Stored in place of a digest when checksumming was off.
pub const NO_DIGEST: &str = "NA";

/// Metadata record for one packed file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Slash-separated, relative to the parent of the source root.
    pub path: String,
    /// Size reported by the filesystem when the file was enumerated.
    pub size: u64,
    /// Offset of the first content byte within its fragment.
    pub start: u64,
    /// Bytes actually written to the fragment.
    pub length: u64,
    /// Lowercase BLAKE3 hex. Records from older writers that only carry a
    /// `sha1` field decode as `None` and are treated as unchecked.
    #[serde(default, with = "digest_field")]
    pub digest: Option<String>,
}

impl Entry {
    pub fn end(&self) -> Option<u64> {
        self.start.checked_add(self.length)
    }
}

mod digest_field {
    use super::NO_DIGEST;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Option<String>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(d.as_deref().unwrap_or(NO_DIGEST))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let raw = String::deserialize(d)?;
        Ok(if raw == NO_DIGEST { None } else { Some(raw) })
    }
}
