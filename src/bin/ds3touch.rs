use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taufs::{Disk, FileKind, FileSystem};

/// Create a regular file under a parent directory inode.
#[derive(Parser)]
struct Cli {
    /// Disk image file
    image: PathBuf,

    /// Parent directory inode number
    parent_inode: u32,

    /// Name of the file to create
    name: String,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let Ok(mut fs) = Disk::open(&cli.image).and_then(FileSystem::open) else {
        eprintln!("Error creating file");
        return ExitCode::FAILURE;
    };
    match fs.create(cli.parent_inode, FileKind::Regular, &cli.name) {
        Ok(_) => ExitCode::SUCCESS,
        Err(_) => {
            eprintln!("Error creating file");
            ExitCode::FAILURE
        }
    }
}
