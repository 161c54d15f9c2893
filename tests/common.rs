//! Common utilities for tests
#![allow(unused)]

use std::path::{Path, PathBuf};

use taufs::*;

pub const ORANGE: &str = "\x1b[38;5;214m";
pub const RESET: &str = "\x1b[0m";

/// Provides a macro for logging messages during tests.
/// e.g. log!("placeholder") -> println!("[test] placeholder");
#[macro_export]
macro_rules! log {
    ($msg:expr, $($arg:tt)*) => {
        println!("{}[test] {}{}", crate::common::ORANGE, format!($msg, $($arg)*), crate::common::RESET)
    };
    ($msg:expr) => {
        println!("{}[test] {}{}", crate::common::ORANGE, $msg, crate::common::RESET)
    };
}

/// A scratch image path unique to this test and process.
pub fn scratch_image(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("taufs-{name}-{}.img", std::process::id()));
    path
}

/// Creates and formats a fresh image sized exactly for the geometry.
pub fn fresh_fs(name: &str, num_inodes: u32, num_data: u32) -> (FileSystem, PathBuf) {
    let image = scratch_image(name);
    let total = SuperBlock::new(num_inodes, num_data)
        .unwrap()
        .total_blocks();
    let disk = Disk::create(&image, total).unwrap();
    let fs = FileSystem::format(disk, num_inodes, num_data).unwrap();
    (fs, image)
}

/// The bytes of both bitmaps and the inode region, straight from the
/// image file. Operations that promise to leave no trace must keep
/// this snapshot byte-for-byte identical.
pub fn metadata_snapshot(image: &Path, sb: &SuperBlock) -> Vec<u8> {
    let bytes = std::fs::read(image).unwrap();
    let range = |addr: u32, len: u32| {
        let start = addr as usize * BLOCK_SIZE;
        start..start + len as usize * BLOCK_SIZE
    };
    let mut snapshot = Vec::new();
    snapshot.extend_from_slice(&bytes[range(sb.inode_bitmap_addr, sb.inode_bitmap_len)]);
    snapshot.extend_from_slice(&bytes[range(sb.data_bitmap_addr, sb.data_bitmap_len)]);
    snapshot.extend_from_slice(&bytes[range(sb.inode_region_addr, sb.inode_region_len)]);
    snapshot
}

/// Number of allocated data blocks according to the data bitmap.
pub fn data_blocks_in_use(fs: &FileSystem) -> u32 {
    let sb = fs.superblock().unwrap();
    bitmap::count_set(&fs.read_data_bitmap(&sb).unwrap(), sb.num_data)
}
