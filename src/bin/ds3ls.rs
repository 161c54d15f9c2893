use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use taufs::path::{resolve, Resolved};
use taufs::{DirEntry, Disk, FileSystem, Result, DIR_ENTRY_SIZE, ROOT_INODE_ID};

/// List a directory, or the single entry naming a file.
#[derive(Parser)]
struct Cli {
    /// Disk image file
    image: PathBuf,

    /// Absolute path inside the image, e.g. /a/b
    path: String,
}

fn entries_of(fs: &FileSystem, inode: u32) -> Result<Vec<DirEntry>> {
    let size = fs.stat(inode)?.size as usize;
    let mut buf = vec![0u8; size];
    fs.read(inode, &mut buf)?;
    Ok(buf.chunks(DIR_ENTRY_SIZE).map(DirEntry::decode).collect())
}

fn run(cli: &Cli) -> Result<()> {
    let fs = FileSystem::open(Disk::open(&cli.image)?)?;
    let Resolved { parent, inode } = resolve(&fs, ROOT_INODE_ID, &cli.path)?;

    if fs.stat(inode)?.is_directory() {
        let mut entries = entries_of(&fs, inode)?;
        entries.sort_by(|a, b| a.name_bytes().cmp(b.name_bytes()));
        for entry in entries {
            println!(
                "{}\t{}",
                entry.inum,
                String::from_utf8_lossy(entry.name_bytes())
            );
        }
    } else {
        // A file is shown as its entry in the parent directory.
        for entry in entries_of(&fs, parent)? {
            if entry.inum == inode {
                println!(
                    "{}\t{}",
                    entry.inum,
                    String::from_utf8_lossy(entry.name_bytes())
                );
                break;
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    if !cli.path.starts_with('/') {
        eprintln!("Directory not found");
        return ExitCode::FAILURE;
    }
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => {
            eprintln!("Directory not found");
            ExitCode::FAILURE
        }
    }
}
