//! Directory and file operations on top of the disk, the record codec
//! and the bitmap allocator.
//!
//! Operations hold no state between calls: each one re-reads the
//! superblock and whatever bitmaps and inode records it needs, mutates
//! in-memory copies, and stages the changed blocks through a disk
//! transaction. Mutating operations open their own transaction unless
//! the caller already holds one, so a service can batch several calls
//! into a single atomic unit.

use log::debug;

use crate::bitmap;
use crate::config::*;
use crate::disk::Disk;
use crate::error::{FsError, Result};
use crate::layout::{DirEntry, FileKind, Inode, SuperBlock};

#[derive(Debug)]
pub struct FileSystem {
    disk: Disk,
}

impl FileSystem {
    /// Builds a fresh filesystem on `disk`: superblock, zeroed bitmaps
    /// and inode region, and a root directory holding `.` and `..` in
    /// data block 0.
    pub fn format(mut disk: Disk, num_inodes: u32, num_data: u32) -> Result<Self> {
        let sb = SuperBlock::new(num_inodes, num_data)?;
        if disk.num_blocks() < sb.total_blocks() {
            return Err(FsError::NoSpace);
        }

        let mut block = [0u8; BLOCK_SIZE];
        sb.encode(&mut block);
        disk.write_block(SUPERBLOCK_ID, &block)?;

        let zero = [0u8; BLOCK_SIZE];
        for addr in sb.inode_bitmap_addr..sb.data_region_addr {
            disk.write_block(addr, &zero)?;
        }

        let mut fs = FileSystem { disk };

        let mut inode_bitmap = fs.read_inode_bitmap(&sb)?;
        let mut data_bitmap = fs.read_data_bitmap(&sb)?;
        bitmap::set(&mut inode_bitmap, ROOT_INODE_ID);
        bitmap::set(&mut data_bitmap, 0);

        let mut inodes = vec![Inode::ZERO; num_inodes as usize];
        inodes[ROOT_INODE_ID as usize] = Inode::new_dir(0);

        let mut root_block = [0u8; BLOCK_SIZE];
        DirEntry::new(ROOT_INODE_ID, DOT_NAME)?.encode(&mut root_block[..DIR_ENTRY_SIZE]);
        DirEntry::new(ROOT_INODE_ID, DOTDOT_NAME)?
            .encode(&mut root_block[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE]);
        fs.disk.write_block(sb.data_region_addr, &root_block)?;

        fs.write_inode_bitmap(&sb, &inode_bitmap)?;
        fs.write_data_bitmap(&sb, &data_bitmap)?;
        fs.write_inode_region(&sb, &inodes)?;
        Ok(fs)
    }

    /// Mounts an existing image after validating its superblock.
    ///
    /// Panics if the backing file is shorter than the superblock
    /// claims; that is a disk-layout bug the caller must prevent.
    pub fn open(disk: Disk) -> Result<Self> {
        let fs = FileSystem { disk };
        let sb = fs.superblock()?;
        assert!(
            fs.disk.num_blocks() >= sb.total_blocks(),
            "backing file has {} blocks but the superblock claims {}",
            fs.disk.num_blocks(),
            sb.total_blocks(),
        );
        Ok(fs)
    }

    pub fn superblock(&self) -> Result<SuperBlock> {
        SuperBlock::decode(&self.disk.read_block(SUPERBLOCK_ID)?)
    }

    // Transaction control, forwarded so a caller can batch several
    // operations into one atomic unit.

    pub fn begin_transaction(&mut self) -> Result<()> {
        self.disk.begin_transaction()
    }

    pub fn commit(&mut self) -> Result<()> {
        self.disk.commit()
    }

    pub fn rollback(&mut self) -> Result<()> {
        self.disk.rollback()
    }

    pub fn in_transaction(&self) -> bool {
        self.disk.in_transaction()
    }

    // Raw region access, used by the operations below and by the
    // inspection tools.

    pub fn read_inode_bitmap(&self, sb: &SuperBlock) -> Result<Vec<u8>> {
        self.read_region(sb.inode_bitmap_addr, sb.inode_bitmap_len)
    }

    pub fn read_data_bitmap(&self, sb: &SuperBlock) -> Result<Vec<u8>> {
        self.read_region(sb.data_bitmap_addr, sb.data_bitmap_len)
    }

    pub fn read_inode_region(&self, sb: &SuperBlock) -> Result<Vec<Inode>> {
        let bytes = self.read_region(sb.inode_region_addr, sb.inode_region_len)?;
        (0..sb.num_inodes as usize)
            .map(|i| Inode::decode(&bytes[i * INODE_SIZE..(i + 1) * INODE_SIZE]))
            .collect()
    }

    fn read_region(&self, addr: u32, len: u32) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(len as usize * BLOCK_SIZE);
        for i in 0..len {
            bytes.extend_from_slice(&self.disk.read_block(addr + i)?);
        }
        Ok(bytes)
    }

    fn write_inode_bitmap(&mut self, sb: &SuperBlock, bitmap: &[u8]) -> Result<()> {
        self.write_region(sb.inode_bitmap_addr, bitmap)
    }

    fn write_data_bitmap(&mut self, sb: &SuperBlock, bitmap: &[u8]) -> Result<()> {
        self.write_region(sb.data_bitmap_addr, bitmap)
    }

    fn write_inode_region(&mut self, sb: &SuperBlock, inodes: &[Inode]) -> Result<()> {
        let mut bytes = vec![0u8; sb.inode_region_len as usize * BLOCK_SIZE];
        for (i, inode) in inodes.iter().enumerate() {
            inode.encode(&mut bytes[i * INODE_SIZE..(i + 1) * INODE_SIZE]);
        }
        self.write_region(sb.inode_region_addr, &bytes)
    }

    fn write_region(&mut self, addr: u32, bytes: &[u8]) -> Result<()> {
        for (i, chunk) in bytes.chunks(BLOCK_SIZE).enumerate() {
            let mut block = [0u8; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            self.disk.write_block(addr + i as u32, &block)?;
        }
        Ok(())
    }

    fn data_block(&self, sb: &SuperBlock, offset: u32) -> Result<[u8; BLOCK_SIZE]> {
        self.disk.read_block(sb.data_region_addr + offset)
    }

    /// All packed entries of a directory inode, in stored order.
    fn dir_entries(&self, sb: &SuperBlock, dir: &Inode) -> Result<Vec<DirEntry>> {
        let total = dir.size as usize / DIR_ENTRY_SIZE;
        let mut entries = Vec::with_capacity(total);
        'blocks: for i in 0..dir.block_count() {
            let block = self.data_block(sb, dir.direct[i])?;
            for j in 0..DIRENTS_PER_BLOCK {
                if entries.len() == total {
                    break 'blocks;
                }
                entries.push(DirEntry::decode(
                    &block[j * DIR_ENTRY_SIZE..(j + 1) * DIR_ENTRY_SIZE],
                ));
            }
        }
        Ok(entries)
    }

    /// The inode must be in range and allocated, else `InvalidInode`.
    fn require_allocated(
        &self,
        sb: &SuperBlock,
        inode_bitmap: &[u8],
        inode_id: u32,
    ) -> Result<()> {
        if inode_id >= sb.num_inodes || !bitmap::is_set(inode_bitmap, inode_id) {
            return Err(FsError::InvalidInode);
        }
        Ok(())
    }

    /// Runs `op` inside this filesystem's own transaction unless the
    /// caller already opened one, in which case the outer owner decides
    /// the fate of the batch.
    fn with_txn<T>(&mut self, op: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let owns = !self.disk.in_transaction();
        if owns {
            self.disk.begin_transaction()?;
        }
        match op(self) {
            Ok(value) => {
                if owns {
                    self.disk.commit()?;
                }
                Ok(value)
            }
            Err(e) => {
                if owns {
                    let _ = self.disk.rollback();
                }
                Err(e)
            }
        }
    }

    /// Inode of `name` inside directory `parent`.
    pub fn lookup(&self, parent: u32, name: &str) -> Result<u32> {
        let sb = self.superblock()?;
        let inode_bitmap = self.read_inode_bitmap(&sb)?;
        self.require_allocated(&sb, &inode_bitmap, parent)?;
        let inodes = self.read_inode_region(&sb)?;
        let parent_inode = &inodes[parent as usize];
        if !parent_inode.is_directory() {
            return Err(FsError::InvalidInode);
        }
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(FsError::NotFound);
        }
        for entry in self.dir_entries(&sb, parent_inode)? {
            if entry.name_eq(name.as_bytes()) {
                return Ok(entry.inum);
            }
        }
        Err(FsError::NotFound)
    }

    /// The stored inode record.
    pub fn stat(&self, inode_id: u32) -> Result<Inode> {
        let sb = self.superblock()?;
        let inode_bitmap = self.read_inode_bitmap(&sb)?;
        self.require_allocated(&sb, &inode_bitmap, inode_id)?;
        Ok(self.read_inode_region(&sb)?[inode_id as usize])
    }

    /// Reads up to `buf.len()` bytes from the start of the file and
    /// returns how many were copied: `min(buf.len(), size)`.
    pub fn read(&self, inode_id: u32, buf: &mut [u8]) -> Result<usize> {
        let sb = self.superblock()?;
        let inode_bitmap = self.read_inode_bitmap(&sb)?;
        self.require_allocated(&sb, &inode_bitmap, inode_id)?;
        let inode = self.read_inode_region(&sb)?[inode_id as usize];
        if inode.is_directory() && buf.len() % DIR_ENTRY_SIZE != 0 {
            return Err(FsError::InvalidSize);
        }
        let n = buf.len().min(inode.size as usize);
        let mut copied = 0;
        for i in 0..n.div_ceil(BLOCK_SIZE) {
            let block = self.data_block(&sb, inode.direct[i])?;
            let take = (n - copied).min(BLOCK_SIZE);
            buf[copied..copied + take].copy_from_slice(&block[..take]);
            copied += take;
        }
        Ok(n)
    }

    /// Replaces the entire content of a regular file with `data`.
    /// Grows and shrinks the file's block set as needed; vacated
    /// blocks go back to the data bitmap.
    pub fn write(&mut self, inode_id: u32, data: &[u8]) -> Result<usize> {
        debug!("write: {} byte(s) to inode {inode_id}", data.len());
        self.with_txn(|fs| fs.write_inner(inode_id, data))
    }

    fn write_inner(&mut self, inode_id: u32, data: &[u8]) -> Result<usize> {
        let sb = self.superblock()?;
        let inode_bitmap = self.read_inode_bitmap(&sb)?;
        self.require_allocated(&sb, &inode_bitmap, inode_id)?;
        let mut inodes = self.read_inode_region(&sb)?;
        let mut inode = inodes[inode_id as usize];
        if inode.is_directory() {
            return Err(FsError::InvalidType);
        }
        if data.len() > MAX_FILE_SIZE {
            return Err(FsError::FileTooLarge);
        }

        let mut data_bitmap = self.read_data_bitmap(&sb)?;
        let old_count = inode.block_count();
        let new_count = data.len().div_ceil(BLOCK_SIZE).max(1);
        for slot in old_count..new_count {
            let block = bitmap::first_free(&data_bitmap, sb.num_data).ok_or(FsError::NoSpace)?;
            bitmap::set(&mut data_bitmap, block);
            inode.direct[slot] = block;
        }
        for slot in new_count..old_count {
            bitmap::clear(&mut data_bitmap, inode.direct[slot]);
            inode.direct[slot] = 0;
        }

        for (i, chunk) in data.chunks(BLOCK_SIZE).enumerate() {
            let mut block = [0u8; BLOCK_SIZE];
            block[..chunk.len()].copy_from_slice(chunk);
            self.disk
                .write_block(sb.data_region_addr + inode.direct[i], &block)?;
        }

        inode.size = data.len() as u32;
        inodes[inode_id as usize] = inode;
        self.write_data_bitmap(&sb, &data_bitmap)?;
        self.write_inode_region(&sb, &inodes)?;
        Ok(data.len())
    }

    /// Ensures a child named `name` of the given kind exists under
    /// directory `parent` and returns its inode. An existing child of
    /// the same kind is returned as-is; a kind clash is an error.
    pub fn create(&mut self, parent: u32, kind: FileKind, name: &str) -> Result<u32> {
        debug!("create: {kind:?} '{name}' under inode {parent}");
        self.with_txn(|fs| fs.create_inner(parent, kind, name))
    }

    fn create_inner(&mut self, parent: u32, kind: FileKind, name: &str) -> Result<u32> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(FsError::InvalidName);
        }
        let sb = self.superblock()?;
        let mut inode_bitmap = self.read_inode_bitmap(&sb)?;
        self.require_allocated(&sb, &inode_bitmap, parent)?;
        let mut inodes = self.read_inode_region(&sb)?;
        let mut parent_inode = inodes[parent as usize];
        if !parent_inode.is_directory() {
            return Err(FsError::InvalidInode);
        }

        for entry in self.dir_entries(&sb, &parent_inode)? {
            if entry.name_eq(name.as_bytes()) {
                return if inodes[entry.inum as usize].kind == kind {
                    Ok(entry.inum)
                } else {
                    Err(FsError::InvalidType)
                };
            }
        }

        // The child inode and its first data block come from separate
        // bitmaps; the parent's extra block, if any, must come after
        // the child's choice.
        let child = bitmap::first_free(&inode_bitmap, sb.num_inodes).ok_or(FsError::NoSpace)?;
        bitmap::set(&mut inode_bitmap, child);
        let mut data_bitmap = self.read_data_bitmap(&sb)?;
        let child_block = bitmap::first_free(&data_bitmap, sb.num_data).ok_or(FsError::NoSpace)?;
        bitmap::set(&mut data_bitmap, child_block);

        inodes[child as usize] = match kind {
            FileKind::Regular => Inode::new_file(child_block),
            FileKind::Directory => Inode::new_dir(child_block),
        };

        let mut fresh_parent_block = false;
        if parent_inode.size as usize % BLOCK_SIZE == 0 {
            // Last parent block is full; grow the directory by one.
            if parent_inode.size as usize == MAX_FILE_SIZE {
                return Err(FsError::NoSpace);
            }
            let grown = bitmap::first_free(&data_bitmap, sb.num_data).ok_or(FsError::NoSpace)?;
            bitmap::set(&mut data_bitmap, grown);
            parent_inode.direct[parent_inode.size as usize / BLOCK_SIZE] = grown;
            fresh_parent_block = true;
        }

        let append_at = parent_inode.size as usize;
        let slot_block = parent_inode.direct[append_at / BLOCK_SIZE];
        let slot_offset = append_at % BLOCK_SIZE;
        let mut block = if fresh_parent_block {
            [0u8; BLOCK_SIZE]
        } else {
            self.data_block(&sb, slot_block)?
        };
        DirEntry::new(child, name.as_bytes())?
            .encode(&mut block[slot_offset..slot_offset + DIR_ENTRY_SIZE]);
        self.disk
            .write_block(sb.data_region_addr + slot_block, &block)?;
        parent_inode.size += DIR_ENTRY_SIZE as u32;
        inodes[parent as usize] = parent_inode;

        if kind == FileKind::Directory {
            let mut child_content = [0u8; BLOCK_SIZE];
            DirEntry::new(child, DOT_NAME)?.encode(&mut child_content[..DIR_ENTRY_SIZE]);
            DirEntry::new(parent, DOTDOT_NAME)?
                .encode(&mut child_content[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE]);
            self.disk
                .write_block(sb.data_region_addr + child_block, &child_content)?;
        }

        self.write_inode_bitmap(&sb, &inode_bitmap)?;
        self.write_data_bitmap(&sb, &data_bitmap)?;
        self.write_inode_region(&sb, &inodes)?;
        Ok(child)
    }

    /// Removes the entry `name` from directory `parent` and frees the
    /// target's blocks and inode. Removing an absent name succeeds.
    pub fn unlink(&mut self, parent: u32, name: &str) -> Result<()> {
        debug!("unlink: '{name}' under inode {parent}");
        self.with_txn(|fs| fs.unlink_inner(parent, name))
    }

    fn unlink_inner(&mut self, parent: u32, name: &str) -> Result<()> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(FsError::InvalidName);
        }
        if name.as_bytes() == DOT_NAME || name.as_bytes() == DOTDOT_NAME {
            return Err(FsError::UnlinkNotAllowed);
        }
        let sb = self.superblock()?;
        let mut inode_bitmap = self.read_inode_bitmap(&sb)?;
        self.require_allocated(&sb, &inode_bitmap, parent)?;
        let mut inodes = self.read_inode_region(&sb)?;
        let mut parent_inode = inodes[parent as usize];
        if !parent_inode.is_directory() {
            return Err(FsError::InvalidInode);
        }

        let entries = self.dir_entries(&sb, &parent_inode)?;
        let Some(found) = entries.iter().position(|e| e.name_eq(name.as_bytes())) else {
            return Ok(());
        };
        let target_id = entries[found].inum;
        let target = inodes[target_id as usize];
        if target.is_directory() && target.size as usize > 2 * DIR_ENTRY_SIZE {
            return Err(FsError::DirNotEmpty);
        }

        let mut data_bitmap = self.read_data_bitmap(&sb)?;
        for slot in 0..target.block_count() {
            bitmap::clear(&mut data_bitmap, target.direct[slot]);
        }
        bitmap::clear(&mut inode_bitmap, target_id);
        inodes[target_id as usize] = Inode::ZERO;

        // Close the hole by moving the last entry into it, then drop
        // the parent's last block if the removal emptied it.
        let last = entries.len() - 1;
        if found != last {
            let hole_block = parent_inode.direct[found / DIRENTS_PER_BLOCK];
            let hole_offset = (found % DIRENTS_PER_BLOCK) * DIR_ENTRY_SIZE;
            let mut block = self.data_block(&sb, hole_block)?;
            entries[last].encode(&mut block[hole_offset..hole_offset + DIR_ENTRY_SIZE]);
            self.disk
                .write_block(sb.data_region_addr + hole_block, &block)?;
        }
        parent_inode.size -= DIR_ENTRY_SIZE as u32;
        if parent_inode.size as usize % BLOCK_SIZE == 0 {
            let vacated = parent_inode.size as usize / BLOCK_SIZE;
            bitmap::clear(&mut data_bitmap, parent_inode.direct[vacated]);
            parent_inode.direct[vacated] = 0;
        }
        inodes[parent as usize] = parent_inode;

        self.write_inode_bitmap(&sb, &inode_bitmap)?;
        self.write_data_bitmap(&sb, &data_bitmap)?;
        self.write_inode_region(&sb, &inodes)?;
        Ok(())
    }
}
