use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taufs::{Disk, FileSystem, BLOCK_SIZE};

/// Print a regular file's data block numbers and contents.
#[derive(Parser)]
struct Cli {
    /// Disk image file
    image: PathBuf,

    /// Inode number of the file
    inode: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let Ok(fs) = Disk::open(&cli.image).and_then(FileSystem::open) else {
        eprintln!("Error reading file");
        return ExitCode::FAILURE;
    };
    let inode = match fs.stat(cli.inode) {
        Ok(inode) if !inode.is_directory() => inode,
        _ => {
            eprintln!("Error reading file");
            return ExitCode::FAILURE;
        }
    };

    println!("File blocks");
    for slot in 0..(inode.size as usize).div_ceil(BLOCK_SIZE) {
        println!("{}", inode.direct[slot]);
    }
    println!();

    println!("File data");
    let mut contents = vec![0u8; inode.size as usize];
    if fs.read(cli.inode, &mut contents) != Ok(inode.size as usize) {
        eprintln!("Error reading file");
        return ExitCode::FAILURE;
    }
    std::io::stdout().write_all(&contents).ok();
    ExitCode::SUCCESS
}
