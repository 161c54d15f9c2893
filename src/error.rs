use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsError {
    InvalidInode,
    InvalidName,
    InvalidType,
    InvalidSize,
    NotFound,
    NoSpace,
    FileTooLarge,
    DirNotEmpty,
    UnlinkNotAllowed,
    OutOfBounds,
    NestedTransaction,
    NoTransaction,
    TransactionPoisoned,
    InvalidSuperBlock,
    Io,
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            FsError::InvalidInode => "invalid inode",
            FsError::InvalidName => "invalid name",
            FsError::InvalidType => "invalid type",
            FsError::InvalidSize => "invalid size",
            FsError::NotFound => "not found",
            FsError::NoSpace => "not enough space",
            FsError::FileTooLarge => "file too large",
            FsError::DirNotEmpty => "directory not empty",
            FsError::UnlinkNotAllowed => "unlink not allowed",
            FsError::OutOfBounds => "block address out of bounds",
            FsError::NestedTransaction => "transaction already open",
            FsError::NoTransaction => "no open transaction",
            FsError::TransactionPoisoned => "transaction poisoned",
            FsError::InvalidSuperBlock => "invalid superblock",
            FsError::Io => "disk i/o error",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for FsError {}

pub type Result<T> = core::result::Result<T, FsError>;
