//! Fixed-size block device over a backing file, with transactional
//! batching of block writes.
//!
//! Writes inside a transaction go through to the file immediately; the
//! block's pre-image is saved on first touch so `rollback` can restore
//! the file byte-for-byte to its state at `begin_transaction`. A write
//! past the end of the device fails and poisons the open transaction:
//! the next `commit` refuses and performs the rollback itself.

use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::os::unix::fs::FileExt;
use std::path::Path;

use log::{debug, error};

use crate::config::BLOCK_SIZE;
use crate::error::{FsError, Result};

pub type Block = [u8; BLOCK_SIZE];

#[derive(Debug)]
pub struct Disk {
    file: File,
    num_blocks: u32,
    txn: Option<Txn>,
}

#[derive(Debug)]
struct Txn {
    preimages: BTreeMap<u32, Box<Block>>,
    poisoned: bool,
}

impl Disk {
    /// Creates (or truncates) a backing file of exactly
    /// `num_blocks * BLOCK_SIZE` zero bytes.
    pub fn create(path: &Path, num_blocks: u32) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| {
                error!("create {}: {e}", path.display());
                FsError::Io
            })?;
        file.set_len(num_blocks as u64 * BLOCK_SIZE as u64)
            .map_err(|_| FsError::Io)?;
        Ok(Disk {
            file,
            num_blocks,
            txn: None,
        })
    }

    /// Opens an existing image. The block count is derived from the
    /// file length, which must be a whole number of blocks.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| {
                error!("open {}: {e}", path.display());
                FsError::Io
            })?;
        let len = file.metadata().map_err(|_| FsError::Io)?.len();
        if len == 0 || len % BLOCK_SIZE as u64 != 0 {
            return Err(FsError::InvalidSuperBlock);
        }
        Ok(Disk {
            file,
            num_blocks: (len / BLOCK_SIZE as u64) as u32,
            txn: None,
        })
    }

    pub fn num_blocks(&self) -> u32 {
        self.num_blocks
    }

    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    pub fn read_block(&self, addr: u32) -> Result<Block> {
        if addr >= self.num_blocks {
            return Err(FsError::OutOfBounds);
        }
        let mut block = [0u8; BLOCK_SIZE];
        self.file
            .read_exact_at(&mut block, addr as u64 * BLOCK_SIZE as u64)
            .map_err(|e| {
                error!("read block {addr}: {e}");
                FsError::Io
            })?;
        Ok(block)
    }

    /// Writes one block. Inside a transaction the block's pre-image is
    /// recorded the first time it is touched; an out-of-range address
    /// or I/O failure poisons the transaction.
    pub fn write_block(&mut self, addr: u32, block: &Block) -> Result<()> {
        if addr >= self.num_blocks {
            if let Some(txn) = &mut self.txn {
                txn.poisoned = true;
            }
            return Err(FsError::OutOfBounds);
        }
        if let Some(txn) = &mut self.txn {
            if !txn.preimages.contains_key(&addr) {
                let mut pre = Box::new([0u8; BLOCK_SIZE]);
                if let Err(e) = self
                    .file
                    .read_exact_at(pre.as_mut(), addr as u64 * BLOCK_SIZE as u64)
                {
                    error!("read pre-image of block {addr}: {e}");
                    txn.poisoned = true;
                    return Err(FsError::Io);
                }
                txn.preimages.insert(addr, pre);
            }
        }
        if let Err(e) = self
            .file
            .write_all_at(block, addr as u64 * BLOCK_SIZE as u64)
        {
            error!("write block {addr}: {e}");
            if let Some(txn) = &mut self.txn {
                txn.poisoned = true;
            }
            return Err(FsError::Io);
        }
        Ok(())
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.txn.is_some() {
            return Err(FsError::NestedTransaction);
        }
        self.txn = Some(Txn {
            preimages: BTreeMap::new(),
            poisoned: false,
        });
        Ok(())
    }

    /// Makes the transaction's writes durable. A poisoned transaction
    /// is rolled back instead and the commit fails.
    pub fn commit(&mut self) -> Result<()> {
        let txn = self.txn.take().ok_or(FsError::NoTransaction)?;
        if txn.poisoned {
            self.restore(&txn.preimages)?;
            return Err(FsError::TransactionPoisoned);
        }
        debug!("commit: {} block(s)", txn.preimages.len());
        self.file.sync_data().map_err(|_| FsError::Io)?;
        Ok(())
    }

    /// Restores every written block to its pre-image and discards the
    /// transaction.
    pub fn rollback(&mut self) -> Result<()> {
        let txn = self.txn.take().ok_or(FsError::NoTransaction)?;
        debug!("rollback: {} block(s)", txn.preimages.len());
        self.restore(&txn.preimages)
    }

    fn restore(&mut self, preimages: &BTreeMap<u32, Box<Block>>) -> Result<()> {
        for (addr, pre) in preimages {
            self.file
                .write_all_at(pre.as_ref(), *addr as u64 * BLOCK_SIZE as u64)
                .map_err(|e| {
                    error!("restore block {addr}: {e}");
                    FsError::Io
                })?;
        }
        Ok(())
    }
}
