use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taufs::{Disk, FileSystem, Result};

/// Print the superblock geometry and both allocation bitmaps.
#[derive(Parser)]
struct Cli {
    /// Disk image file
    image: PathBuf,
}

fn run(cli: &Cli) -> Result<()> {
    let fs = FileSystem::open(Disk::open(&cli.image)?)?;
    let sb = fs.superblock()?;

    println!("Super");
    println!("inode_region_addr {}", sb.inode_region_addr);
    println!("inode_region_len {}", sb.inode_region_len);
    println!("num_inodes {}", sb.num_inodes);
    println!("data_region_addr {}", sb.data_region_addr);
    println!("data_region_len {}", sb.data_region_len);
    println!("num_data {}", sb.num_data);
    println!();

    println!("Inode bitmap");
    let inode_bitmap = fs.read_inode_bitmap(&sb)?;
    for byte in &inode_bitmap[..(sb.num_inodes as usize).div_ceil(8)] {
        print!("{byte} ");
    }
    println!();
    println!();

    println!("Data bitmap");
    let data_bitmap = fs.read_data_bitmap(&sb)?;
    for byte in &data_bitmap[..(sb.num_data as usize).div_ceil(8)] {
        print!("{byte} ");
    }
    println!();
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {e}", cli.image.display());
            ExitCode::FAILURE
        }
    }
}
