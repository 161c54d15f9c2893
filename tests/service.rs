#![allow(unused)]

mod common;

use common::fresh_fs;
use taufs::{FileService, Method, Request, Response, BLOCK_SIZE};

fn service(name: &str) -> FileService {
    let (fs, _) = fresh_fs(name, 64, 64);
    FileService::new(fs, "/ds3/")
}

fn request(svc: &mut FileService, method: Method, path: &str, body: &[u8]) -> Response {
    svc.handle(&Request {
        method,
        path: path.to_string(),
        body: body.to_vec(),
    })
}

fn get(svc: &mut FileService, path: &str) -> Response {
    request(svc, Method::Get, path, b"")
}

fn put(svc: &mut FileService, path: &str, body: &[u8]) -> Response {
    request(svc, Method::Put, path, body)
}

fn delete(svc: &mut FileService, path: &str) -> Response {
    request(svc, Method::Delete, path, b"")
}

#[test]
fn fresh_disk_lists_empty_root() {
    let mut svc = service("svc-fresh");
    let resp = get(&mut svc, "/ds3/");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"");
}

#[test]
fn create_and_read_a_file() {
    let mut svc = service("svc-file");
    assert_eq!(put(&mut svc, "/ds3/a.txt", b"hello").status, 200);

    let resp = get(&mut svc, "/ds3/a.txt");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"hello");
    assert_eq!(resp.content_type, Some("text/plain"));

    let listing = get(&mut svc, "/ds3/");
    assert_eq!(listing.status, 200);
    assert_eq!(listing.body, b"a.txt\n");
}

#[test]
fn nested_directory_creation() {
    let mut svc = service("svc-nested");
    assert_eq!(put(&mut svc, "/ds3/x/y/z.txt", b"q").status, 200);

    assert_eq!(get(&mut svc, "/ds3/x/").body, b"y/\n");
    assert_eq!(get(&mut svc, "/ds3/x/y/").body, b"z.txt\n");
    assert_eq!(get(&mut svc, "/ds3/x/y/z.txt").body, b"q");
}

#[test]
fn putting_a_directory_over_a_file_conflicts() {
    let mut svc = service("svc-conflict");
    assert_eq!(put(&mut svc, "/ds3/a.txt", b"hello").status, 200);
    assert_eq!(put(&mut svc, "/ds3/a.txt/", b"").status, 409);
}

#[test]
fn putting_a_file_over_a_directory_conflicts() {
    let mut svc = service("svc-conflict-dir");
    assert_eq!(put(&mut svc, "/ds3/d/", b"").status, 200);
    assert_eq!(put(&mut svc, "/ds3/d", b"data").status, 409);
}

#[test]
fn intermediate_file_segment_conflicts() {
    let mut svc = service("svc-inter");
    assert_eq!(put(&mut svc, "/ds3/a.txt", b"hello").status, 200);
    assert_eq!(put(&mut svc, "/ds3/a.txt/b.txt", b"x").status, 409);
}

#[test]
fn traversal_attempts_are_rejected() {
    let mut svc = service("svc-traversal");
    assert_eq!(get(&mut svc, "/ds3/../etc/passwd").status, 400);
    assert_eq!(put(&mut svc, "/ds3/a/../b", b"x").status, 400);
    assert_eq!(delete(&mut svc, "/ds3/..").status, 400);
}

#[test]
fn delete_is_idempotent() {
    let mut svc = service("svc-delete");
    assert_eq!(put(&mut svc, "/ds3/a.txt", b"hello").status, 200);

    assert_eq!(delete(&mut svc, "/ds3/a.txt").status, 200);
    assert_eq!(delete(&mut svc, "/ds3/a.txt").status, 200);
    assert_eq!(get(&mut svc, "/ds3/a.txt").status, 404);
}

#[test]
fn root_is_protected() {
    let mut svc = service("svc-root");
    assert_eq!(put(&mut svc, "/ds3/", b"").status, 409);
    assert_eq!(delete(&mut svc, "/ds3/").status, 400);
}

#[test]
fn requests_outside_the_prefix_are_rejected() {
    let mut svc = service("svc-prefix");
    assert_eq!(get(&mut svc, "/other/a.txt").status, 400);
    assert_eq!(get(&mut svc, "/ds3").status, 400);
    assert_eq!(put(&mut svc, "/a.txt", b"x").status, 400);
}

#[test]
fn directory_put_with_body_is_rejected() {
    let mut svc = service("svc-dirbody");
    assert_eq!(put(&mut svc, "/ds3/d/", b"payload").status, 400);
    // Nothing was created.
    assert_eq!(get(&mut svc, "/ds3/d/").status, 404);
}

#[test]
fn missing_paths_are_not_found() {
    let mut svc = service("svc-missing");
    assert_eq!(get(&mut svc, "/ds3/nope").status, 404);
    assert_eq!(get(&mut svc, "/ds3/no/such/file").status, 404);
    assert_eq!(delete(&mut svc, "/ds3/no/such/file").status, 404);
}

#[test]
fn put_overwrites_file_contents() {
    let mut svc = service("svc-overwrite");
    assert_eq!(put(&mut svc, "/ds3/a.txt", b"one").status, 200);
    assert_eq!(put(&mut svc, "/ds3/a.txt", b"two!").status, 200);
    assert_eq!(get(&mut svc, "/ds3/a.txt").body, b"two!");
}

#[test]
fn empty_files_and_directories_read_back_empty() {
    let mut svc = service("svc-empty");
    assert_eq!(put(&mut svc, "/ds3/empty.txt", b"").status, 200);
    let resp = get(&mut svc, "/ds3/empty.txt");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"");

    assert_eq!(put(&mut svc, "/ds3/hollow/", b"").status, 200);
    let resp = get(&mut svc, "/ds3/hollow/");
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body, b"");
}

#[test]
fn listing_marks_directories_and_hides_dot_entries() {
    let mut svc = service("svc-listing");
    put(&mut svc, "/ds3/afile", b"1");
    put(&mut svc, "/ds3/adir/", b"");
    put(&mut svc, "/ds3/adir/inner", b"2");

    let resp = get(&mut svc, "/ds3/");
    assert_eq!(resp.status, 200);
    // Stored order: insertion order.
    assert_eq!(resp.body, b"afile\nadir/\n");
    assert_eq!(get(&mut svc, "/ds3/adir/").body, b"inner\n");
}

#[test]
fn full_disk_reports_insufficient_storage_and_rolls_back() {
    // Two data blocks total: the root's and one more.
    let (fs, _) = fresh_fs("svc-full", 8, 2);
    let mut svc = FileService::new(fs, "/ds3/");

    // Creating the file succeeds, but its content needs a second block.
    let resp = put(&mut svc, "/ds3/big.txt", &vec![b'x'; BLOCK_SIZE + 1]);
    assert_eq!(resp.status, 507);

    // The whole PUT rolled back, including the create.
    assert_eq!(get(&mut svc, "/ds3/big.txt").status, 404);
    assert_eq!(get(&mut svc, "/ds3/").body, b"");
}

#[test]
fn deleting_a_populated_directory_is_rejected() {
    let mut svc = service("svc-rmdir");
    put(&mut svc, "/ds3/d/", b"");
    put(&mut svc, "/ds3/d/inner", b"x");

    assert_eq!(delete(&mut svc, "/ds3/d").status, 400);
    assert_eq!(delete(&mut svc, "/ds3/d/inner").status, 200);
    assert_eq!(delete(&mut svc, "/ds3/d").status, 200);
    assert_eq!(get(&mut svc, "/ds3/d/").status, 404);
}
