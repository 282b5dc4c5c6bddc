use std::path::Path;

use crate::container::entry::Entry;
use crate::error::Result;
use crate::read::reader::Chain;

#[derive(Clone, Debug)]
pub struct Listing {
    /// Bare file name of the fragment holding the entry.
    pub fragment: String,
    pub entry: Entry,
}

pub fn list(archive: &Path) -> Result<Vec<Listing>> {
    let mut out = Vec::new();
    for item in Chain::open(archive) {
        let item = item?;
        let fragment = item
            .fragment()
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        out.push(Listing {
            fragment,
            entry: item.entry,
        });
    }
    Ok(out)
}
