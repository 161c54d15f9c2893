//! taufs is a tiny Unix-style block filesystem over a fixed-size disk
//! image, with an HTTP-facing file service layered on top.
//!
//! Linear layout of an image:
//! - Superblock
//! - Inode Bitmap
//! - Data Bitmap
//! - Inode Region
//! - Data Region
//!
//! Layers, bottom to top:
//! 1. Disk: block I/O over the backing file, transactional write batching.
//! 2. Layout: on-disk record shapes and their little-endian codec.
//! 3. Bitmap: first-fit allocation of inode and data block IDs.
//! 4. FileSystem: lookup/stat/read/write/create/unlink over the disk.
//! 5. Path: absolute-path resolution to inodes.
//! 6. FileService: GET/PUT/DELETE under a path prefix, for an HTTP host.

mod config;
mod disk;
mod error;
mod fs;
mod layout;
mod service;

pub mod bitmap;
pub mod path;

pub use config::*;
pub use disk::{Block, Disk};
pub use error::FsError as Error;
pub use error::{FsError, Result};
pub use fs::FileSystem;
pub use layout::{DirEntry, FileKind, Inode, SuperBlock};
pub use service::{FileService, Method, Request, Response, ServiceError};
