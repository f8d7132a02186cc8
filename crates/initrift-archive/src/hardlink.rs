//! Deferred hardlink handling.
//!
//! newc expects exactly one name of a hardlinked inode to carry the content,
//! and whether a name is the last one is only known once the whole tree has
//! been seen. Candidates are therefore buffered until finalize.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::entry::EntryDescriptor;
use crate::{CpioError, Result};

/// Names collected for one archive inode.
#[derive(Debug, Clone)]
pub struct HardlinkGroup {
    /// Descriptor of the first sighting, carrying the host link count
    pub descriptor: EntryDescriptor,
    /// Host path the content is read from
    pub source: PathBuf,
    /// Archive names in observation order
    pub names: Vec<Vec<u8>>,
}

/// Fewer names were archived than the host reports links for an inode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardlinkDeficit {
    pub inode: u64,
    pub declared: u64,
    pub observed: u64,
    pub source: PathBuf,
    /// Archive names that were seen, in observation order
    pub names: Vec<String>,
}

/// The records a [`HardlinkGroup`] turns into.
#[derive(Debug, Clone)]
pub struct ResolvedGroup {
    /// Descriptor of the zero-length references
    pub stand_in: EntryDescriptor,
    /// Names written as zero-length references
    pub stand_in_names: Vec<Vec<u8>>,
    /// Descriptor of the record that carries the content
    pub canonical: EntryDescriptor,
    pub canonical_name: Vec<u8>,
    pub source: PathBuf,
    pub deficit: Option<HardlinkDeficit>,
}

impl HardlinkGroup {
    /// Check the observed names against the host link count and plan the
    /// records to write.
    pub fn resolve(self) -> Result<ResolvedGroup> {
        let HardlinkGroup {
            descriptor,
            source,
            mut names,
        } = self;
        let declared = descriptor.nlink;
        let observed = names.len() as u64;
        let display_names = || {
            names
                .iter()
                .map(|n| String::from_utf8_lossy(n).into_owned())
                .collect::<Vec<_>>()
        };

        if observed > declared {
            return Err(CpioError::HardlinkCountExceeded {
                inode: descriptor.ino,
                declared,
                names: display_names(),
            });
        }

        // some links live outside the archived tree
        let deficit = (observed < declared).then(|| HardlinkDeficit {
            inode: descriptor.ino,
            declared,
            observed,
            source: source.clone(),
            names: display_names(),
        });

        let canonical = descriptor.with_nlink(observed);
        let stand_in = canonical.with_size(0);
        // observe() never opens a group without a name
        let canonical_name = names.pop().ok_or(CpioError::EmptyHardlinkGroup {
            inode: descriptor.ino,
        })?;

        Ok(ResolvedGroup {
            stand_in,
            stand_in_names: names,
            canonical,
            canonical_name,
            source,
            deficit,
        })
    }
}

/// Buffers hardlink candidates keyed by archive inode, in first-seen order.
#[derive(Debug, Default)]
pub struct HardlinkCollector {
    groups: Vec<HardlinkGroup>,
    by_inode: HashMap<u64, usize>,
}

impl HardlinkCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one name of `ino`. The descriptor of later sightings is not
    /// kept; they are assumed to describe the same object.
    pub fn observe(&mut self, ino: u64, descriptor: EntryDescriptor, source: &Path, name: Vec<u8>) {
        match self.by_inode.get(&ino) {
            Some(&index) => self.groups[index].names.push(name),
            None => {
                self.by_inode.insert(ino, self.groups.len());
                self.groups.push(HardlinkGroup {
                    descriptor,
                    source: source.to_path_buf(),
                    names: vec![name],
                });
            }
        }
    }

    /// Number of pending groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Take every pending group, in first-seen order.
    pub fn drain(&mut self) -> Vec<HardlinkGroup> {
        self.by_inode.clear();
        std::mem::take(&mut self.groups)
    }
}
