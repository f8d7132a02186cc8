//! Metadata and content providers consumed by the archive session.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Read};
use std::os::unix::fs::MetadataExt;
use std::path::Path;

/// Host metadata for one path, as reported by `lstat(2)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawMetadata {
    pub dev: u64,
    pub ino: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u64,
    pub size: u64,
    /// Whole seconds since the epoch
    pub mtime: i64,
    pub rdev: u64,
    /// Target of a symlink, in host encoding
    pub link_target: Option<OsString>,
}

impl RawMetadata {
    pub fn from_metadata(md: &fs::Metadata, link_target: Option<OsString>) -> Self {
        Self {
            dev: md.dev(),
            ino: md.ino(),
            mode: md.mode(),
            uid: md.uid(),
            gid: md.gid(),
            nlink: md.nlink(),
            size: md.size(),
            mtime: md.mtime(),
            rdev: md.rdev(),
            link_target,
        }
    }
}

/// Source of metadata and file content for archived paths.
pub trait Filesystem {
    /// Stat `path` without following a final symlink.
    fn lstat(&self, path: &Path) -> io::Result<RawMetadata>;

    /// Open a regular file for reading its content.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;
}

/// The live host filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostFs;

impl Filesystem for HostFs {
    fn lstat(&self, path: &Path) -> io::Result<RawMetadata> {
        let md = fs::symlink_metadata(path)?;
        let link_target = if md.file_type().is_symlink() {
            Some(fs::read_link(path)?.into_os_string())
        } else {
            None
        };
        Ok(RawMetadata::from_metadata(&md, link_target))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(File::open(path)?))
    }
}
