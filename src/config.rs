pub const BLOCK_SIZE: usize = 4096;
pub const SUPERBLOCK_ID: u32 = 0; // Block ID of the superblock
pub const ROOT_INODE_ID: u32 = 0; // Inode ID of the root directory

pub const DIRECT_PTRS: usize = 30; // Direct block pointers per inode
pub const INODE_SIZE: usize = 8 + DIRECT_PTRS * 4; // kind + size + direct pointers
pub const MAX_FILE_SIZE: usize = DIRECT_PTRS * BLOCK_SIZE;

pub const DIR_ENTRY_SIZE: usize = 32; // Inode ID (4 bytes) + name field
pub const NAME_FIELD_LEN: usize = DIR_ENTRY_SIZE - 4; // Zero-padded on disk
pub const MAX_NAME_LEN: usize = NAME_FIELD_LEN - 1; // Last byte stays NUL

pub const INODES_PER_BLOCK: usize = BLOCK_SIZE / INODE_SIZE;
pub const DIRENTS_PER_BLOCK: usize = BLOCK_SIZE / DIR_ENTRY_SIZE;

pub const DOT_NAME: &[u8] = b".";
pub const DOTDOT_NAME: &[u8] = b"..";
