//! HTTP-facing file service.
//!
//! The transport is someone else's problem: a request arrives as
//! `(method, path, body)` and leaves as `(status, body)`. The service
//! strips its path prefix, resolves the rest against the filesystem,
//! and translates filesystem errors into the four client-visible
//! statuses.

use log::debug;

use crate::config::{DIR_ENTRY_SIZE, DOTDOT_NAME, DOT_NAME, ROOT_INODE_ID};
use crate::error::FsError;
use crate::fs::FileSystem;
use crate::layout::{DirEntry, FileKind};
use crate::path::{self, Resolved};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Put,
    Delete,
}

#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub path: String,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: u16,
    pub content_type: Option<&'static str>,
    pub body: Vec<u8>,
}

impl Response {
    fn ok(body: Vec<u8>, content_type: Option<&'static str>) -> Self {
        Response {
            status: 200,
            content_type,
            body,
        }
    }

    fn empty() -> Self {
        Response::ok(Vec::new(), None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceError {
    BadRequest,
    NotFound,
    Conflict,
    InsufficientStorage,
}

impl ServiceError {
    pub fn status(self) -> u16 {
        match self {
            ServiceError::BadRequest => 400,
            ServiceError::NotFound => 404,
            ServiceError::Conflict => 409,
            ServiceError::InsufficientStorage => 507,
        }
    }
}

impl From<FsError> for ServiceError {
    fn from(e: FsError) -> Self {
        match e {
            FsError::NoSpace => ServiceError::InsufficientStorage,
            FsError::NotFound => ServiceError::NotFound,
            FsError::InvalidType => ServiceError::Conflict,
            _ => ServiceError::BadRequest,
        }
    }
}

type ServiceResult<T> = core::result::Result<T, ServiceError>;

/// Maps `GET`/`PUT`/`DELETE` under a path prefix onto the filesystem.
pub struct FileService {
    fs: FileSystem,
    prefix: String,
}

impl FileService {
    /// `prefix` is the mount point, e.g. `/ds3/`; it must start and
    /// end with a slash.
    pub fn new(fs: FileSystem, prefix: impl Into<String>) -> Self {
        FileService {
            fs,
            prefix: prefix.into(),
        }
    }

    pub fn fs(&self) -> &FileSystem {
        &self.fs
    }

    pub fn handle(&mut self, request: &Request) -> Response {
        match self.dispatch(request) {
            Ok(response) => response,
            Err(e) => {
                debug!("{:?} {} -> {}", request.method, request.path, e.status());
                Response {
                    status: e.status(),
                    content_type: None,
                    body: Vec::new(),
                }
            }
        }
    }

    fn dispatch(&mut self, request: &Request) -> ServiceResult<Response> {
        let rest = request
            .path
            .strip_prefix(&self.prefix)
            .ok_or(ServiceError::BadRequest)?;
        let fs_path = format!("/{rest}");
        // Coarse traversal guard; resolution never walks upward.
        if fs_path.contains("..") {
            return Err(ServiceError::BadRequest);
        }
        match request.method {
            Method::Get => self.get(&fs_path),
            Method::Put => self.put(&fs_path, &request.body),
            Method::Delete => self.delete(&fs_path),
        }
    }

    fn get(&mut self, fs_path: &str) -> ServiceResult<Response> {
        let Resolved { inode, .. } = path::resolve(&self.fs, ROOT_INODE_ID, fs_path)
            .map_err(|_| ServiceError::NotFound)?;
        let record = self.fs.stat(inode)?;
        let mut buf = vec![0u8; record.size as usize];
        let n = self.fs.read(inode, &mut buf)?;
        if !record.is_directory() {
            return Ok(Response::ok(buf, Some("text/plain")));
        }

        // Listing: one name per line in stored order, directories
        // marked with a trailing slash, `.` and `..` omitted.
        let mut body = Vec::new();
        for raw in buf[..n].chunks(DIR_ENTRY_SIZE) {
            let entry = DirEntry::decode(raw);
            if entry.name_eq(DOT_NAME) || entry.name_eq(DOTDOT_NAME) {
                continue;
            }
            body.extend_from_slice(entry.name_bytes());
            if self.fs.stat(entry.inum)?.is_directory() {
                body.push(b'/');
            }
            body.push(b'\n');
        }
        Ok(Response::ok(body, None))
    }

    fn put(&mut self, fs_path: &str, body: &[u8]) -> ServiceResult<Response> {
        let segs: Vec<&str> = path::segments(fs_path).collect();
        let Some((last, intermediate)) = segs.split_last() else {
            return Err(ServiceError::Conflict);
        };
        let wants_dir = fs_path.ends_with('/');
        if wants_dir && !body.is_empty() {
            return Err(ServiceError::BadRequest);
        }

        self.fs
            .begin_transaction()
            .map_err(|_| ServiceError::BadRequest)?;
        match self.put_inner(intermediate, last, wants_dir, body) {
            Ok(()) => {
                self.fs.commit().map_err(|_| ServiceError::BadRequest)?;
                Ok(Response::empty())
            }
            Err(e) => {
                let _ = self.fs.rollback();
                Err(e)
            }
        }
    }

    fn put_inner(
        &mut self,
        intermediate: &[&str],
        last: &str,
        wants_dir: bool,
        body: &[u8],
    ) -> ServiceResult<()> {
        let mut parent = ROOT_INODE_ID;
        for segment in intermediate {
            parent = self.ensure_dir(parent, segment)?;
        }
        if wants_dir {
            self.fs.create(parent, FileKind::Directory, last)?;
        } else {
            let target = self.fs.create(parent, FileKind::Regular, last)?;
            self.fs.write(target, body)?;
        }
        Ok(())
    }

    /// Looks up one intermediate segment, creating it as a directory
    /// when missing. An existing regular file in the way is a conflict.
    fn ensure_dir(&mut self, parent: u32, segment: &str) -> ServiceResult<u32> {
        match self.fs.lookup(parent, segment) {
            Ok(inode) => {
                if self.fs.stat(inode)?.is_directory() {
                    Ok(inode)
                } else {
                    Err(ServiceError::Conflict)
                }
            }
            Err(FsError::NotFound) => Ok(self.fs.create(parent, FileKind::Directory, segment)?),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&mut self, fs_path: &str) -> ServiceResult<Response> {
        let segs: Vec<&str> = path::segments(fs_path).collect();
        let Some((name, intermediate)) = segs.split_last() else {
            return Err(ServiceError::BadRequest);
        };
        let mut parent = ROOT_INODE_ID;
        for segment in intermediate {
            parent = self
                .fs
                .lookup(parent, segment)
                .map_err(|_| ServiceError::NotFound)?;
        }

        self.fs
            .begin_transaction()
            .map_err(|_| ServiceError::BadRequest)?;
        match self.fs.unlink(parent, name) {
            Ok(()) => {
                self.fs.commit().map_err(|_| ServiceError::BadRequest)?;
                Ok(Response::empty())
            }
            Err(e) => {
                let _ = self.fs.rollback();
                Err(e.into())
            }
        }
    }
}
