#![forbid(unsafe_code)]

pub mod error;

pub mod util {
    pub mod digest;
}

pub mod container {
    pub mod entry;
    pub mod index;
    pub mod layout;
    pub mod trailer;
}

pub mod pack {
    pub mod join;
    pub mod walker;
    pub mod writer;
}

pub mod read {
    pub mod extract;
    pub mod reader;
    pub mod verify;
}

pub mod list;

// Re-exports: stable API surface
pub use container::entry::{Entry, NO_DIGEST};
pub use container::index::FragmentIndex;
pub use container::layout::{EXTENSION, SIZE_LIMIT};
pub use list::{Listing, list};
pub use pack::join::{JoinOptions, JoinReport, join, join_files, normalize_destination};
pub use read::extract::{EntryFailure, ExtractOptions, ExtractReport, extract};
pub use read::reader::Chain;
pub use read::verify::{VerifyReport, verify};
