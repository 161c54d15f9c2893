//! Path resolution utilities.
//!
//! Paths are absolute, slash-separated, and empty segments collapse,
//! so `/a//b` resolves like `/a/b`. Resolution never interprets `..`;
//! callers that accept untrusted paths reject it before resolving.

use crate::error::{FsError, Result};
use crate::fs::FileSystem;

/// Terminal inode of a resolved path together with its parent. For a
/// path with no segments both are the starting inode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolved {
    pub parent: u32,
    pub inode: u32,
}

/// The non-empty segments of a path, in order.
pub fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|s| !s.is_empty())
}

/// Walks `path` segment by segment from `start`. Any segment that
/// fails to resolve, including one that lands in a non-directory,
/// reports `NotFound`.
pub fn resolve(fs: &FileSystem, start: u32, path: &str) -> Result<Resolved> {
    let mut parent = start;
    let mut inode = start;
    for segment in segments(path) {
        parent = inode;
        inode = fs.lookup(parent, segment).map_err(|_| FsError::NotFound)?;
    }
    Ok(Resolved { parent, inode })
}
