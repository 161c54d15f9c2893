use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taufs::{Disk, FileSystem};

/// Copy a host file into an existing inode on the image.
#[derive(Parser)]
struct Cli {
    /// Disk image file
    image: PathBuf,

    /// Host file to copy from
    src: PathBuf,

    /// Destination inode number
    dst_inode: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let Ok(data) = std::fs::read(&cli.src) else {
        eprintln!("Failed to open file");
        return ExitCode::FAILURE;
    };
    let Ok(mut fs) = Disk::open(&cli.image).and_then(FileSystem::open) else {
        eprintln!("Could not write to dst_file");
        return ExitCode::FAILURE;
    };
    match fs.write(cli.dst_inode, &data) {
        Ok(n) if n == data.len() => ExitCode::SUCCESS,
        _ => {
            eprintln!("Could not write to dst_file");
            ExitCode::FAILURE
        }
    }
}
