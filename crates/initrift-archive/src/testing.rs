//! In-memory [`Filesystem`] for exercising sessions without touching disk.
//!
//! Paths are stored verbatim. Content can be swapped after the metadata was
//! taken, which is how a file that changes mid-archive is simulated.
//!
//! # Usage
//!
//! ```
//! use initrift_archive::testing::MemoryFs;
//! use initrift_archive::{ArchiveOptions, CpioSession};
//!
//! let mut fs = MemoryFs::new();
//! fs.add_dir("/root");
//! fs.add_file("/root/init", b"#!/bin/sh\n");
//!
//! let mut session = CpioSession::with_filesystem(Vec::new(), ArchiveOptions::default(), fs);
//! session.inject("/root", Some("/root".as_ref())).unwrap();
//! session.inject("/root/init", Some("/root".as_ref())).unwrap();
//! session.finalize().unwrap();
//! ```

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::entry::{S_IFDIR, S_IFLNK, S_IFREG};
use crate::source::{Filesystem, RawMetadata};

/// Device id reported for every node
pub const MEMORY_DEV: u64 = 0x0801;

/// Default mtime of created nodes
pub const MEMORY_MTIME: i64 = 1_700_000_000;

#[derive(Debug, Clone)]
struct MemoryNode {
    meta: RawMetadata,
    content: Vec<u8>,
}

/// A flat map of paths to metadata and content.
#[derive(Debug)]
pub struct MemoryFs {
    nodes: HashMap<PathBuf, MemoryNode>,
    next_ino: u64,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            // host-like inode numbers, far from the archive's own ids
            next_ino: 1000,
        }
    }

    fn base_meta(&mut self, mode: u32) -> RawMetadata {
        let ino = self.next_ino;
        self.next_ino += 1;
        RawMetadata {
            dev: MEMORY_DEV,
            ino,
            mode,
            uid: 1000,
            gid: 1000,
            nlink: 1,
            size: 0,
            mtime: MEMORY_MTIME,
            rdev: 0,
            link_target: None,
        }
    }

    pub fn add_dir(&mut self, path: impl Into<PathBuf>) -> &mut RawMetadata {
        let mut meta = self.base_meta(S_IFDIR | 0o755);
        meta.nlink = 2;
        meta.size = 4096;
        self.insert(path.into(), meta, Vec::new())
    }

    pub fn add_file(&mut self, path: impl Into<PathBuf>, content: &[u8]) -> &mut RawMetadata {
        let mut meta = self.base_meta(S_IFREG | 0o644);
        meta.size = content.len() as u64;
        self.insert(path.into(), meta, content.to_vec())
    }

    pub fn add_symlink(
        &mut self,
        path: impl Into<PathBuf>,
        target: impl Into<OsString>,
    ) -> &mut RawMetadata {
        let target = target.into();
        let mut meta = self.base_meta(S_IFLNK | 0o777);
        meta.size = target.len() as u64;
        meta.link_target = Some(target);
        self.insert(path.into(), meta, Vec::new())
    }

    /// Add a contentless node of any type, e.g. a device or FIFO.
    pub fn add_node(&mut self, path: impl Into<PathBuf>, mode: u32) -> &mut RawMetadata {
        let meta = self.base_meta(mode);
        self.insert(path.into(), meta, Vec::new())
    }

    /// Link `new` to the inode of `existing`, bumping the link count of
    /// every name of that inode.
    ///
    /// # Panics
    /// If `existing` was never added.
    pub fn add_hardlink(&mut self, existing: impl AsRef<Path>, new: impl Into<PathBuf>) {
        let node = self
            .nodes
            .get(existing.as_ref())
            .cloned()
            .unwrap_or_else(|| panic!("no such node: {}", existing.as_ref().display()));
        let identity = (node.meta.dev, node.meta.ino);

        self.nodes.insert(new.into(), node);
        let nlink = self
            .nodes
            .values()
            .filter(|n| (n.meta.dev, n.meta.ino) == identity)
            .count() as u64;
        for n in self.nodes.values_mut() {
            if (n.meta.dev, n.meta.ino) == identity {
                n.meta.nlink = nlink;
            }
        }
    }

    /// Replace the content served for `path` without touching its metadata.
    ///
    /// # Panics
    /// If `path` was never added.
    pub fn set_content(&mut self, path: impl AsRef<Path>, content: &[u8]) {
        let path = path.as_ref();
        let node = self
            .nodes
            .get_mut(path)
            .unwrap_or_else(|| panic!("no such node: {}", path.display()));
        node.content = content.to_vec();
    }

    pub fn metadata_mut(&mut self, path: impl AsRef<Path>) -> Option<&mut RawMetadata> {
        self.nodes.get_mut(path.as_ref()).map(|n| &mut n.meta)
    }

    fn insert(&mut self, path: PathBuf, meta: RawMetadata, content: Vec<u8>) -> &mut RawMetadata {
        let node = MemoryNode { meta, content };
        match self.nodes.entry(path) {
            Entry::Occupied(mut slot) => {
                slot.insert(node);
                &mut slot.into_mut().meta
            }
            Entry::Vacant(slot) => &mut slot.insert(node).meta,
        }
    }

    fn node(&self, path: &Path) -> io::Result<&MemoryNode> {
        self.nodes.get(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such node: {}", path.display()),
            )
        })
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

impl Filesystem for MemoryFs {
    fn lstat(&self, path: &Path) -> io::Result<RawMetadata> {
        Ok(self.node(path)?.meta.clone())
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(self.node(path)?.content.as_slice()))
    }
}
