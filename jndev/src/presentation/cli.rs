use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "jndev: pack directory trees into .jn containers", long_about = None)]
pub struct Cli {
    /// Log at debug level (JN_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join files under one or more sources into a container.
    /// With more than one path, the last one is the destination.
    #[command(visible_alias = "j")]
    Join {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Store a BLAKE3 digest per file
        #[arg(short = 'c', long)]
        checksum: bool,

        /// Announce that output is split into 4 GB fragments
        #[arg(short, long)]
        split: bool,
    },

    /// Extract a container chain into a directory
    #[command(visible_alias = "x")]
    Extract {
        /// First fragment of the chain
        archive: PathBuf,
        /// Destination directory (default: EXTRACT-<millis>)
        dest: Option<PathBuf>,

        /// Write entries without checking stored digests
        #[arg(long)]
        no_verify: bool,
    },

    /// List every entry of a container chain
    List { archive: PathBuf },

    /// Recompute stored digests without extracting
    Verify { archive: PathBuf },
}
