pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use jn_core::error::Result;

pub fn run(cli: Cli) -> Result<bool> {
    match cli.command {
        Commands::Join {
            paths,
            checksum,
            split,
        } => handlers::handle_join(paths, checksum, split),
        Commands::Extract {
            archive,
            dest,
            no_verify,
        } => handlers::handle_extract(archive, dest, no_verify),
        Commands::List { archive } => handlers::handle_list(archive),
        Commands::Verify { archive } => handlers::handle_verify(archive),
    }
}
