use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taufs::{Disk, FileSystem, SuperBlock};

/// Create an empty disk image with a freshly formatted filesystem.
#[derive(Parser)]
struct Cli {
    /// Disk image file to create
    image: PathBuf,

    /// Number of inodes the image can hold
    #[arg(long, default_value_t = 32)]
    num_inodes: u32,

    /// Number of data blocks the image can hold
    #[arg(long, default_value_t = 32)]
    num_data: u32,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let total_blocks = match SuperBlock::new(cli.num_inodes, cli.num_data) {
        Ok(sb) => sb.total_blocks(),
        Err(e) => {
            eprintln!("invalid geometry: {e}");
            return ExitCode::FAILURE;
        }
    };
    let result = Disk::create(&cli.image, total_blocks)
        .and_then(|disk| FileSystem::format(disk, cli.num_inodes, cli.num_data));
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("failed to format {}: {e}", cli.image.display());
            ExitCode::FAILURE
        }
    }
}
