use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taufs::{Disk, FileSystem};

/// Remove an entry from a parent directory inode.
#[derive(Parser)]
struct Cli {
    /// Disk image file
    image: PathBuf,

    /// Parent directory inode number
    parent_inode: u32,

    /// Name of the entry to remove
    name: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let Ok(mut fs) = Disk::open(&cli.image).and_then(FileSystem::open) else {
        eprintln!("Error removing entry");
        return ExitCode::FAILURE;
    };
    match fs.unlink(cli.parent_inode, &cli.name) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => {
            eprintln!("Error removing entry");
            ExitCode::FAILURE
        }
    }
}
