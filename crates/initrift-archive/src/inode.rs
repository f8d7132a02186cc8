//! Archive-local inode numbering.
//!
//! Host inode numbers can exceed the 32-bit header field and collide across
//! devices, so every `(device, inode)` pair gets a small id on first sight.

use std::collections::HashMap;

/// Maps host `(device, inode)` identities to a dense sequence starting at 1.
#[derive(Debug)]
pub struct InodeTracker {
    ids: HashMap<(u64, u64), u64>,
    next: u64,
}

impl InodeTracker {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            next: 1,
        }
    }

    /// Return the archive inode for a host identity, allocating one if needed.
    pub fn resolve(&mut self, dev: u64, ino: u64) -> u64 {
        *self.ids.entry((dev, ino)).or_insert_with(|| {
            let id = self.next;
            self.next += 1;
            id
        })
    }

    /// Number of distinct identities seen so far
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Default for InodeTracker {
    fn default() -> Self {
        Self::new()
    }
}
