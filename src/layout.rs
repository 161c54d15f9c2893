//! On-disk record shapes and their byte codec.
//!
//! Every scalar is little-endian. Records are encoded and decoded
//! explicitly so endianness and padding are spelled out in one place
//! instead of reinterpreting block buffers in memory.

use crate::config::*;
use crate::error::{FsError, Result};

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes(buf[offset..offset + 4].try_into().unwrap())
}

fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Superblock, stored at the start of block 0. The remainder of the
/// block is zero. Addresses and lengths are in blocks; `num_inodes`
/// and `num_data` count entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuperBlock {
    pub inode_bitmap_addr: u32,
    pub inode_bitmap_len: u32,
    pub data_bitmap_addr: u32,
    pub data_bitmap_len: u32,
    pub inode_region_addr: u32,
    pub inode_region_len: u32,
    pub data_region_addr: u32,
    pub data_region_len: u32,
    pub num_inodes: u32,
    pub num_data: u32,
}

impl SuperBlock {
    pub const ENCODED_LEN: usize = 10 * 4;

    /// Computes the linear layout for a fresh image:
    /// superblock, inode bitmap, data bitmap, inode region, data region.
    pub fn new(num_inodes: u32, num_data: u32) -> Result<Self> {
        if num_inodes == 0 || num_data == 0 {
            return Err(FsError::InvalidSuperBlock);
        }

        let bits_per_block = (BLOCK_SIZE * 8) as u32;
        let inode_bitmap_addr = SUPERBLOCK_ID + 1;
        let inode_bitmap_len = num_inodes.div_ceil(bits_per_block);
        let data_bitmap_addr = inode_bitmap_addr + inode_bitmap_len;
        let data_bitmap_len = num_data.div_ceil(bits_per_block);
        let inode_region_addr = data_bitmap_addr + data_bitmap_len;
        let inode_region_len = num_inodes.div_ceil(INODES_PER_BLOCK as u32);
        let data_region_addr = inode_region_addr + inode_region_len;

        Ok(SuperBlock {
            inode_bitmap_addr,
            inode_bitmap_len,
            data_bitmap_addr,
            data_bitmap_len,
            inode_region_addr,
            inode_region_len,
            data_region_addr,
            data_region_len: num_data,
            num_inodes,
            num_data,
        })
    }

    /// Total image size in blocks.
    pub fn total_blocks(&self) -> u32 {
        self.data_region_addr + self.data_region_len
    }

    pub fn encode(&self, block: &mut [u8]) {
        let fields = [
            self.inode_bitmap_addr,
            self.inode_bitmap_len,
            self.data_bitmap_addr,
            self.data_bitmap_len,
            self.inode_region_addr,
            self.inode_region_len,
            self.data_region_addr,
            self.data_region_len,
            self.num_inodes,
            self.num_data,
        ];
        for (i, field) in fields.into_iter().enumerate() {
            write_u32(block, i * 4, field);
        }
    }

    pub fn decode(block: &[u8]) -> Result<Self> {
        if block.len() < Self::ENCODED_LEN {
            return Err(FsError::InvalidSuperBlock);
        }
        let sb = SuperBlock {
            inode_bitmap_addr: read_u32(block, 0),
            inode_bitmap_len: read_u32(block, 4),
            data_bitmap_addr: read_u32(block, 8),
            data_bitmap_len: read_u32(block, 12),
            inode_region_addr: read_u32(block, 16),
            inode_region_len: read_u32(block, 20),
            data_region_addr: read_u32(block, 24),
            data_region_len: read_u32(block, 28),
            num_inodes: read_u32(block, 32),
            num_data: read_u32(block, 36),
        };
        sb.validate()?;
        Ok(sb)
    }

    /// The regions must tile the image in order and each bitmap must
    /// cover its entity count.
    fn validate(&self) -> Result<()> {
        let bits_per_block = (BLOCK_SIZE * 8) as u32;
        let ordered = self.inode_bitmap_addr == SUPERBLOCK_ID + 1
            && self.data_bitmap_addr == self.inode_bitmap_addr + self.inode_bitmap_len
            && self.inode_region_addr == self.data_bitmap_addr + self.data_bitmap_len
            && self.data_region_addr == self.inode_region_addr + self.inode_region_len;
        let covered = self.num_inodes > 0
            && self.num_data > 0
            && self.num_inodes <= self.inode_bitmap_len * bits_per_block
            && self.num_data <= self.data_bitmap_len * bits_per_block
            && self.num_inodes <= self.inode_region_len * INODES_PER_BLOCK as u32
            && self.num_data == self.data_region_len;
        if ordered && covered {
            Ok(())
        } else {
            Err(FsError::InvalidSuperBlock)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Regular = 0,
    Directory = 1,
}

impl FileKind {
    fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(FileKind::Regular),
            1 => Ok(FileKind::Directory),
            _ => Err(FsError::InvalidInode),
        }
    }
}

/// A fixed-size inode record: kind tag, size in bytes, and direct
/// block pointers. Direct pointers are offsets into the data region,
/// not absolute block addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inode {
    pub kind: FileKind,
    pub size: u32,
    pub direct: [u32; DIRECT_PTRS],
}

impl Inode {
    pub const ZERO: Self = Inode {
        kind: FileKind::Regular,
        size: 0,
        direct: [0; DIRECT_PTRS],
    };

    pub fn new_file(first_block: u32) -> Self {
        let mut inode = Inode::ZERO;
        inode.direct[0] = first_block;
        inode
    }

    pub fn new_dir(first_block: u32) -> Self {
        let mut inode = Inode {
            kind: FileKind::Directory,
            size: (2 * DIR_ENTRY_SIZE) as u32,
            direct: [0; DIRECT_PTRS],
        };
        inode.direct[0] = first_block;
        inode
    }

    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    /// Number of live `direct` slots. Every allocated inode owns at
    /// least the first data block `create` gave it, even at size 0;
    /// slots past this count hold 0 and are never read.
    pub fn block_count(&self) -> usize {
        (self.size as usize).div_ceil(BLOCK_SIZE).max(1)
    }

    pub fn encode(&self, buf: &mut [u8]) {
        write_u32(buf, 0, self.kind as u32);
        write_u32(buf, 4, self.size);
        for (i, ptr) in self.direct.iter().enumerate() {
            write_u32(buf, 8 + i * 4, *ptr);
        }
    }

    pub fn decode(buf: &[u8]) -> Result<Self> {
        let kind = FileKind::from_tag(read_u32(buf, 0))?;
        let size = read_u32(buf, 4);
        let mut direct = [0u32; DIRECT_PTRS];
        for (i, ptr) in direct.iter_mut().enumerate() {
            *ptr = read_u32(buf, 8 + i * 4);
        }
        Ok(Inode { kind, size, direct })
    }
}

/// A directory entry: inode ID plus a zero-padded name. Entries are
/// packed and never straddle a block boundary since their size divides
/// `BLOCK_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirEntry {
    pub inum: u32,
    pub name: [u8; NAME_FIELD_LEN],
}

impl DirEntry {
    pub fn new(inum: u32, name: &[u8]) -> Result<Self> {
        if name.is_empty() || name.len() > MAX_NAME_LEN {
            return Err(FsError::InvalidName);
        }
        let mut field = [0u8; NAME_FIELD_LEN];
        field[..name.len()].copy_from_slice(name);
        Ok(DirEntry { inum, name: field })
    }

    /// The stored name up to its first NUL.
    pub fn name_bytes(&self) -> &[u8] {
        let len = self
            .name
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(NAME_FIELD_LEN);
        &self.name[..len]
    }

    /// Byte-equality up to the first NUL on both sides.
    pub fn name_eq(&self, name: &[u8]) -> bool {
        self.name_bytes() == name
    }

    pub fn encode(&self, buf: &mut [u8]) {
        write_u32(buf, 0, self.inum);
        buf[4..4 + NAME_FIELD_LEN].copy_from_slice(&self.name);
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut name = [0u8; NAME_FIELD_LEN];
        name.copy_from_slice(&buf[4..4 + NAME_FIELD_LEN]);
        DirEntry {
            inum: read_u32(buf, 0),
            name,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn superblock_roundtrip() {
        let sb = SuperBlock::new(64, 128).unwrap();
        let mut block = [0u8; BLOCK_SIZE];
        sb.encode(&mut block);
        assert_eq!(SuperBlock::decode(&block).unwrap(), sb);
        assert_eq!(sb.total_blocks(), sb.data_region_addr + 128);
    }

    #[test]
    fn superblock_rejects_garbage() {
        let block = [0u8; BLOCK_SIZE];
        assert_eq!(
            SuperBlock::decode(&block).unwrap_err(),
            FsError::InvalidSuperBlock
        );
    }

    #[test]
    fn inode_roundtrip() {
        let mut inode = Inode::new_dir(7);
        inode.direct[1] = 9;
        inode.size = 4128;
        let mut buf = [0u8; INODE_SIZE];
        inode.encode(&mut buf);
        assert_eq!(Inode::decode(&buf).unwrap(), inode);
        assert_eq!(inode.block_count(), 2);
    }

    #[test]
    fn empty_inode_owns_one_block() {
        assert_eq!(Inode::new_file(3).block_count(), 1);
    }

    #[test]
    fn dirent_name_rules() {
        let entry = DirEntry::new(5, b"a.txt").unwrap();
        assert!(entry.name_eq(b"a.txt"));
        assert!(!entry.name_eq(b"a.tx"));
        assert!(!entry.name_eq(b"a.txt\0"));

        assert_eq!(DirEntry::new(1, b"").unwrap_err(), FsError::InvalidName);
        assert!(DirEntry::new(1, &[b'x'; 27]).is_ok());
        assert_eq!(
            DirEntry::new(1, &[b'x'; 28]).unwrap_err(),
            FsError::InvalidName
        );
    }

    #[test]
    fn dirent_roundtrip() {
        let entry = DirEntry::new(3, b"notes").unwrap();
        let mut buf = [0u8; DIR_ENTRY_SIZE];
        entry.encode(&mut buf);
        assert_eq!(DirEntry::decode(&buf), entry);
    }
}
