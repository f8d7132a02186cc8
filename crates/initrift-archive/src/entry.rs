//! Canonical archive metadata for one filesystem object.

use std::ffi::OsStr;
use std::path::Path;

use tracing::debug;

use crate::source::RawMetadata;
use crate::{CpioError, Result};

// format: octal posix mode bits
pub const S_IFMT: u32 = 0o170000;
pub const S_IFDIR: u32 = 0o040000;
pub const S_IFREG: u32 = 0o100000;
pub const S_IFLNK: u32 = 0o120000;

/// mtime written when timestamps are not preserved (some unpackers reject 0)
pub const SENTINEL_MTIME: i64 = 1;

/// Largest content length a newc header can describe
pub const MAX_ENTRY_SIZE: u64 = 0xffff_ffff;

/// File type classes the archive treats differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Directory,
    Regular,
    Symlink,
    /// Devices, FIFOs and sockets: mode bits only, never content
    Other,
}

impl FileKind {
    pub fn from_mode(mode: u32) -> Self {
        match mode & S_IFMT {
            S_IFDIR => FileKind::Directory,
            S_IFREG => FileKind::Regular,
            S_IFLNK => FileKind::Symlink,
            _ => FileKind::Other,
        }
    }
}

/// Archive-facing metadata of one entry.
///
/// Fields are wider than the 32-bit header fields on purpose: range checks
/// happen once, in [`crate::header::encode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryDescriptor {
    /// Archive-local inode id
    pub ino: u64,
    pub mode: u32,
    pub uid: u32,
    pub gid: u32,
    pub nlink: u64,
    pub mtime: i64,
    pub size: u64,
    pub dev_major: u64,
    pub dev_minor: u64,
    pub rdev_major: u64,
    pub rdev_minor: u64,
    /// UTF-8 symlink target, written as the symlink's content
    pub link_target: Option<Vec<u8>>,
}

impl EntryDescriptor {
    pub fn kind(&self) -> FileKind {
        FileKind::from_mode(self.mode)
    }

    pub fn is_dir(&self) -> bool {
        self.kind() == FileKind::Directory
    }

    /// Copy of this descriptor with a different content size.
    #[must_use]
    pub fn with_size(&self, size: u64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Copy of this descriptor with a different link count.
    #[must_use]
    pub fn with_nlink(&self, nlink: u64) -> Self {
        Self {
            nlink,
            ..self.clone()
        }
    }
}

/// Turns host metadata into [`EntryDescriptor`]s according to the
/// ownership and timestamp policy of one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    pub preserve_mtime: bool,
    pub preserve_owner: bool,
}

impl Normalizer {
    pub fn new(preserve_mtime: bool, preserve_owner: bool) -> Self {
        Self {
            preserve_mtime,
            preserve_owner,
        }
    }

    /// Build the descriptor for `path` with archive inode `ino`.
    pub fn normalize(&self, path: &Path, raw: &RawMetadata, ino: u64) -> Result<EntryDescriptor> {
        let kind = FileKind::from_mode(raw.mode);

        let mtime = if self.preserve_mtime {
            raw.mtime
        } else {
            SENTINEL_MTIME
        };
        let (uid, gid) = if self.preserve_owner {
            (raw.uid, raw.gid)
        } else {
            (0, 0)
        };
        // self + parent back-reference
        let nlink = if kind == FileKind::Directory {
            2
        } else {
            raw.nlink
        };

        let link_target = match kind {
            FileKind::Symlink => {
                let target = raw.link_target.as_deref().ok_or_else(|| {
                    CpioError::at(
                        path,
                        std::io::Error::new(
                            std::io::ErrorKind::InvalidData,
                            "symlink metadata without a target",
                        ),
                    )
                })?;
                Some(encode_text(path, target)?)
            }
            _ => None,
        };

        let size = match kind {
            FileKind::Regular => raw.size,
            FileKind::Symlink => link_target.as_ref().map_or(0, |t| t.len() as u64),
            FileKind::Directory | FileKind::Other => 0,
        };
        if size > MAX_ENTRY_SIZE {
            return Err(CpioError::SizeOverflow {
                path: path.to_path_buf(),
                size,
            });
        }
        if size != raw.size {
            debug!(path = %path.display(), from = raw.size, to = size, "Replacing reported size");
        }

        let (rdev_major, rdev_minor) = split_dev(raw.rdev);

        Ok(EntryDescriptor {
            ino,
            mode: raw.mode,
            uid,
            gid,
            nlink,
            mtime,
            size,
            dev_major: 0,
            dev_minor: 0,
            rdev_major,
            rdev_minor,
            link_target,
        })
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(true, true)
    }
}

/// Re-encode host bytes as UTF-8 archive text.
pub(crate) fn encode_text(path: &Path, text: &OsStr) -> Result<Vec<u8>> {
    match text.to_str() {
        Some(s) if !s.contains('\0') => Ok(s.as_bytes().to_vec()),
        _ => Err(CpioError::InvalidEncoding {
            path: path.to_path_buf(),
        }),
    }
}

#[cfg(target_os = "linux")]
fn split_dev(dev: u64) -> (u64, u64) {
    (nix::sys::stat::major(dev), nix::sys::stat::minor(dev))
}

// BSD layout: 8-bit major, 24-bit minor
#[cfg(not(target_os = "linux"))]
fn split_dev(dev: u64) -> (u64, u64) {
    ((dev >> 24) & 0xff, dev & 0xff_ffff)
}
