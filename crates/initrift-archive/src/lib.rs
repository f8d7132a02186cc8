//! # initrift-archive
//!
//! Streaming writer for CPIO "new ASCII" (newc) archives, the format the
//! Linux kernel unpacks as an initramfs.
//!
//! ## Record Layout
//!
//! ```text
//! +---------------------------+
//! | "070701"          (6B)    |  magic
//! | 13 x 8 hex digits (104B)  |  ino, mode, uid, gid, nlink, mtime, filesize,
//! |                           |  devmajor, devminor, rdevmajor, rdevminor,
//! |                           |  namesize, check
//! | name + NUL                |
//! | NUL padding to 4          |
//! | content                   |  file bytes or symlink target
//! | NUL padding to 4          |
//! +---------------------------+
//! ```
//!
//! The archive ends with a `TRAILER!!!` record. Host inode numbers are
//! remapped to a dense per-archive sequence so that trees from different
//! filesystems can be merged, and hardlinked files are written once with
//! content and otherwise as zero-length references.
//!
//! ## Usage
//!
//! ```no_run
//! use initrift_archive::CpioSession;
//!
//! let out = std::fs::File::create("initramfs.cpio")?;
//! let mut session = CpioSession::new(out);
//! session.inject_tree("rootfs")?;
//! let summary = session.finalize()?;
//! println!("{} records", summary.records);
//! # Ok::<(), initrift_archive::CpioError>(())
//! ```

mod content;
pub mod entry;
mod hardlink;
pub mod header;
pub mod inode;
mod name;
mod pad;
mod session;
pub mod source;
pub mod testing;
mod tree;

pub use entry::{EntryDescriptor, FileKind, Normalizer};
pub use hardlink::{HardlinkCollector, HardlinkDeficit, HardlinkGroup, ResolvedGroup};
pub use inode::InodeTracker;
pub use name::archive_name;
pub use pad::{padding_for, PaddedWriter};
pub use session::{ArchiveOptions, ArchiveSummary, CpioSession};
pub use source::{Filesystem, HostFs, RawMetadata};

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while building an archive.
///
/// Every variant aborts the build. A partially written sink is left to the
/// caller to discard.
#[derive(Error, Debug)]
pub enum CpioError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("I/O error on {}: {source}", path.display())]
    Path { path: PathBuf, source: io::Error },

    #[error("{} is {size} bytes, newc entries are limited to 4 GiB", path.display())]
    SizeOverflow { path: PathBuf, size: u64 },

    #[error("header field {index} ({field}) out of range: {value}")]
    FieldOverflow {
        index: usize,
        field: &'static str,
        value: i128,
    },

    #[error("entry name {name:?} collides with the archive trailer")]
    ReservedName { name: String },

    #[error("{} shrank while archiving: expected {expected} bytes, got {written}", path.display())]
    ContentTruncated {
        path: PathBuf,
        expected: u64,
        written: u64,
    },

    #[error("unsupported file type {mode:o} with content at {}", path.display())]
    UnsupportedType { path: PathBuf, mode: u32 },

    #[error("found {} names for inode {inode} but the host reports {declared} links: {names:?}", names.len())]
    HardlinkCountExceeded {
        inode: u64,
        declared: u64,
        names: Vec<String>,
    },

    #[error("hardlink group for inode {inode} has no names")]
    EmptyHardlinkGroup { inode: u64 },

    #[error("{} is not valid UTF-8 or contains NUL", path.display())]
    InvalidEncoding { path: PathBuf },

    #[error("{} is not below root {}", path.display(), root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("{} is not a directory", path.display())]
    NotADirectory { path: PathBuf },

    #[error("archive session already finalized")]
    AlreadyFinalized,

    #[error("archive session aborted by an earlier error")]
    Aborted,
}

pub type Result<T> = std::result::Result<T, CpioError>;

impl CpioError {
    pub(crate) fn at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        CpioError::Path {
            path: path.into(),
            source,
        }
    }
}
