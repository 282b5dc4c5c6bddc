use serde::{Deserialize, Serialize};

use super::entry::Entry;
use super::layout::is_bare_name;
use crate::error::{JnError, Result};

/// Per-fragment index, stored as one JSON object between the last entry and
/// the trailer.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FragmentIndex {
    #[serde(alias = "files")]
    pub entries: Vec<Entry>,
    pub fragmented: bool,
    pub next_fragment: Option<String>,
}

impl FragmentIndex {
    /// Index of a fragment that links to `next` (bare file name).
    pub fn linked(entries: Vec<Entry>, next: String) -> Self {
        Self {
            entries,
            fragmented: true,
            next_fragment: Some(next),
        }
    }

    /// Index of the last fragment of a chain.
    pub fn terminal(entries: Vec<Entry>) -> Self {
        Self {
            entries,
            fragmented: false,
            next_fragment: None,
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.check()?;
        serde_json::to_vec(self).map_err(|e| JnError::CorruptIndex(format!("index encode: {e}")))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let index: FragmentIndex = serde_json::from_slice(bytes)
            .map_err(|e| JnError::CorruptIndex(format!("index decode: {e}")))?;
        index.check()?;
        Ok(index)
    }

    fn check(&self) -> Result<()> {
        match (&self.next_fragment, self.fragmented) {
            (None, false) => Ok(()),
            (Some(next), true) if is_bare_name(next) => Ok(()),
            (Some(next), true) => Err(JnError::CorruptIndex(format!(
                "nextFragment is not a bare file name: {next:?}"
            ))),
            (next, fragmented) => Err(JnError::CorruptIndex(format!(
                "fragmented={fragmented} disagrees with nextFragment={next:?}"
            ))),
        }
    }
}
