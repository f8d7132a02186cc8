//! One archive build: entry submission, hardlink flushing and the trailer.

use std::io::Write;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::content;
use crate::entry::{EntryDescriptor, Normalizer};
use crate::hardlink::{HardlinkCollector, HardlinkDeficit};
use crate::header::{self, TRAILER_NAME};
use crate::inode::InodeTracker;
use crate::name::archive_name;
use crate::pad::PaddedWriter;
use crate::source::{Filesystem, HostFs};
use crate::{CpioError, Result};

/// Metadata policy of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// Keep host mtimes; otherwise every entry gets a fixed timestamp
    pub preserve_mtime: bool,
    /// Keep host uid/gid; otherwise every entry is owned by root
    pub preserve_owner: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self {
            preserve_mtime: true,
            preserve_owner: true,
        }
    }
}

/// Outcome of a finished archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveSummary {
    /// Records written, not counting the trailer
    pub records: u64,
    /// Total archive length
    pub bytes: u64,
    /// Distinct host inodes archived
    pub inodes: u64,
    /// Hardlinked inodes with links outside the archived tree
    pub deficits: Vec<HardlinkDeficit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionState {
    Open,
    Finalized,
    Aborted,
}

/// Writes a newc archive to `W`, reading the archived tree through `F`.
///
/// Every error aborts the session; bytes already written stay in the sink.
/// A session dropped while still open is finalized implicitly.
pub struct CpioSession<W: Write, F: Filesystem = HostFs> {
    // None once handed back by into_inner
    out: Option<PaddedWriter<W>>,
    fs: F,
    normalizer: Normalizer,
    inodes: InodeTracker,
    hardlinks: HardlinkCollector,
    state: SessionState,
    records: u64,
    deficits: Vec<HardlinkDeficit>,
}

impl<W: Write> CpioSession<W, HostFs> {
    /// Archive the host filesystem with default options.
    pub fn new(sink: W) -> Self {
        Self::with_options(sink, ArchiveOptions::default())
    }

    pub fn with_options(sink: W, options: ArchiveOptions) -> Self {
        Self::with_filesystem(sink, options, HostFs)
    }
}

impl<W: Write, F: Filesystem> CpioSession<W, F> {
    pub fn with_filesystem(sink: W, options: ArchiveOptions, fs: F) -> Self {
        Self {
            out: Some(PaddedWriter::new(sink)),
            fs,
            normalizer: Normalizer::new(options.preserve_mtime, options.preserve_owner),
            inodes: InodeTracker::new(),
            hardlinks: HardlinkCollector::new(),
            state: SessionState::Open,
            records: 0,
            deficits: Vec::new(),
        }
    }

    /// Bytes written to the sink so far
    pub fn position(&self) -> u64 {
        self.out.as_ref().map_or(0, PaddedWriter::position)
    }

    /// Hardlink groups waiting for finalize
    pub fn pending_hardlinks(&self) -> usize {
        self.hardlinks.len()
    }

    /// Add one path to the archive.
    ///
    /// With a `root`, the archive name is `path` relative to it; without one
    /// the path itself is used, minus any leading `/`.
    pub fn inject(&mut self, path: impl AsRef<Path>, root: Option<&Path>) -> Result<()> {
        self.ensure_open()?;
        let result = self.inject_entry(path.as_ref(), root);
        self.track(result)
    }

    fn inject_entry(&mut self, path: &Path, root: Option<&Path>) -> Result<()> {
        let name = archive_name(path, root)?;
        if name == TRAILER_NAME {
            return Err(CpioError::ReservedName {
                name: String::from_utf8_lossy(&name).into_owned(),
            });
        }

        let raw = self.fs.lstat(path).map_err(|e| CpioError::at(path, e))?;
        let ino = self.inodes.resolve(raw.dev, raw.ino);
        let descriptor = self.normalizer.normalize(path, &raw, ino)?;

        // hardlinked directories are not portable, never merge them
        if descriptor.nlink > 1 && !descriptor.is_dir() {
            debug!(
                path = %path.display(),
                name = %String::from_utf8_lossy(&name),
                ino,
                "Detected potential hardlink"
            );
            self.hardlinks.observe(ino, descriptor, path, name);
            return Ok(());
        }

        self.write_entry(&descriptor, &name, path)
    }

    /// Header, name, content and padding of one record.
    fn write_entry(&mut self, desc: &EntryDescriptor, name: &[u8], source: &Path) -> Result<()> {
        let header = header::encode(desc, name)?;
        let out = self.out.as_mut().ok_or(CpioError::AlreadyFinalized)?;

        out.write_all(&header)?;
        out.align()?;
        content::stream(out, desc, &self.fs, source)?;

        self.records += 1;
        debug!(
            name = %String::from_utf8_lossy(name),
            ino = desc.ino,
            size = desc.size,
            offset = out.position(),
            "Wrote entry"
        );
        Ok(())
    }

    /// Flush pending hardlinks, write the trailer and close the session.
    pub fn finalize(&mut self) -> Result<ArchiveSummary> {
        self.ensure_open()?;
        let result = self.finish_archive();
        let summary = self.track(result)?;
        self.state = SessionState::Finalized;
        Ok(summary)
    }

    fn finish_archive(&mut self) -> Result<ArchiveSummary> {
        let groups = self.hardlinks.drain();
        if !groups.is_empty() {
            debug!(groups = groups.len(), "Writing hardlinks");
        }

        for group in groups {
            let resolved = group.resolve()?;
            if let Some(deficit) = resolved.deficit.clone() {
                info!(
                    ino = deficit.inode,
                    declared = deficit.declared,
                    observed = deficit.observed,
                    source = %deficit.source.display(),
                    names = ?deficit.names,
                    "Found fewer hardlinks than the host reports"
                );
                self.deficits.push(deficit);
            }
            for name in &resolved.stand_in_names {
                self.write_entry(&resolved.stand_in, name, &resolved.source)?;
            }
            self.write_entry(
                &resolved.canonical,
                &resolved.canonical_name,
                &resolved.source,
            )?;
        }

        let trailer = header::encode_trailer()?;
        let out = self.out.as_mut().ok_or(CpioError::AlreadyFinalized)?;
        out.write_all(&trailer)?;
        // for unpackers that read in whole words
        out.align()?;
        out.flush()?;

        let summary = ArchiveSummary {
            records: self.records,
            bytes: out.position(),
            inodes: self.inodes.len() as u64,
            deficits: self.deficits.clone(),
        };
        info!(
            records = summary.records,
            bytes = summary.bytes,
            inodes = summary.inodes,
            "Archive finalized"
        );
        Ok(summary)
    }

    /// Finalize if still open and hand back the sink.
    ///
    /// An aborted session returns its sink as-is so the caller can discard it.
    pub fn into_inner(mut self) -> Result<W> {
        if self.state == SessionState::Open {
            self.finalize()?;
        }
        self.out
            .take()
            .map(PaddedWriter::into_inner)
            .ok_or(CpioError::AlreadyFinalized)
    }

    pub(crate) fn ensure_open(&self) -> Result<()> {
        match self.state {
            SessionState::Open => Ok(()),
            SessionState::Finalized => Err(CpioError::AlreadyFinalized),
            SessionState::Aborted => Err(CpioError::Aborted),
        }
    }

    pub(crate) fn track<T>(&mut self, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.state = SessionState::Aborted;
        }
        result
    }
}

impl<W: Write, F: Filesystem> Drop for CpioSession<W, F> {
    fn drop(&mut self) {
        if self.state != SessionState::Open || self.out.is_none() || std::thread::panicking() {
            return;
        }
        if let Err(err) = self.finalize() {
            warn!(error = %err, "Implicit finalize of archive session failed");
        }
    }
}
