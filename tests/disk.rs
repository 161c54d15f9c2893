#![allow(unused)]

mod common;

use common::scratch_image;
use taufs::{Block, Disk, FsError, BLOCK_SIZE};

const DISK_BLOCKS: u32 = 16;

fn block_of(byte: u8) -> Block {
    [byte; BLOCK_SIZE]
}

fn new_disk(name: &str) -> (Disk, std::path::PathBuf) {
    let image = scratch_image(name);
    (Disk::create(&image, DISK_BLOCKS).unwrap(), image)
}

#[test]
fn write_then_read_back() {
    let (mut disk, _) = new_disk("disk-rw");
    disk.write_block(3, &block_of(0xab)).unwrap();
    assert_eq!(disk.read_block(3).unwrap(), block_of(0xab));
    assert_eq!(disk.read_block(4).unwrap(), block_of(0x00));
}

#[test]
fn reads_see_writes_inside_transaction() {
    let (mut disk, _) = new_disk("disk-ryw");
    disk.begin_transaction().unwrap();
    disk.write_block(2, &block_of(0x11)).unwrap();
    assert_eq!(disk.read_block(2).unwrap(), block_of(0x11));
    disk.commit().unwrap();
    assert_eq!(disk.read_block(2).unwrap(), block_of(0x11));
}

#[test]
fn rollback_restores_image_byte_for_byte() {
    let (mut disk, image) = new_disk("disk-rollback");
    disk.write_block(1, &block_of(0x77)).unwrap();
    let before = std::fs::read(&image).unwrap();

    disk.begin_transaction().unwrap();
    disk.write_block(1, &block_of(0x01)).unwrap();
    disk.write_block(5, &block_of(0x02)).unwrap();
    disk.write_block(1, &block_of(0x03)).unwrap(); // second touch keeps first pre-image
    disk.rollback().unwrap();

    assert_eq!(std::fs::read(&image).unwrap(), before);
}

#[test]
fn commit_makes_writes_durable() {
    let (mut disk, image) = new_disk("disk-commit");
    disk.begin_transaction().unwrap();
    disk.write_block(7, &block_of(0x5a)).unwrap();
    disk.commit().unwrap();

    let bytes = std::fs::read(&image).unwrap();
    assert_eq!(&bytes[7 * BLOCK_SIZE..8 * BLOCK_SIZE], &block_of(0x5a));
}

#[test]
fn nested_begin_is_an_error() {
    let (mut disk, _) = new_disk("disk-nested");
    disk.begin_transaction().unwrap();
    assert_eq!(
        disk.begin_transaction().unwrap_err(),
        FsError::NestedTransaction
    );
    assert!(disk.in_transaction());
}

#[test]
fn commit_without_transaction_is_an_error() {
    let (mut disk, _) = new_disk("disk-notxn");
    assert_eq!(disk.commit().unwrap_err(), FsError::NoTransaction);
    assert_eq!(disk.rollback().unwrap_err(), FsError::NoTransaction);
}

#[test]
fn out_of_range_write_poisons_the_transaction() {
    let (mut disk, image) = new_disk("disk-poison");
    let before = std::fs::read(&image).unwrap();

    disk.begin_transaction().unwrap();
    disk.write_block(0, &block_of(0xee)).unwrap();
    assert_eq!(
        disk.write_block(DISK_BLOCKS, &block_of(0xee)).unwrap_err(),
        FsError::OutOfBounds
    );
    // The poisoned commit refuses and rolls back by itself.
    assert_eq!(disk.commit().unwrap_err(), FsError::TransactionPoisoned);

    assert!(!disk.in_transaction());
    assert_eq!(std::fs::read(&image).unwrap(), before);
}

#[test]
fn out_of_range_access_outside_transaction() {
    let (mut disk, image) = new_disk("disk-oob");
    let before = std::fs::read(&image).unwrap();
    assert_eq!(
        disk.write_block(DISK_BLOCKS + 3, &block_of(0xff)).unwrap_err(),
        FsError::OutOfBounds
    );
    assert_eq!(disk.read_block(DISK_BLOCKS).unwrap_err(), FsError::OutOfBounds);
    assert_eq!(std::fs::read(&image).unwrap(), before);
}
