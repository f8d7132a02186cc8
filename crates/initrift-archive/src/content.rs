//! Record payloads: file bytes or symlink targets.

use std::io::{ErrorKind, Read, Write};
use std::path::Path;

use crate::entry::{EntryDescriptor, FileKind};
use crate::pad::PaddedWriter;
use crate::source::Filesystem;
use crate::{CpioError, Result};

/// Read size for regular file content
pub(crate) const CHUNK_SIZE: usize = 64 * 1024;

/// Write the payload of `desc`, read from `source` on `fs`, and pad it.
pub(crate) fn stream<W: Write, F: Filesystem>(
    out: &mut PaddedWriter<W>,
    desc: &EntryDescriptor,
    fs: &F,
    source: &Path,
) -> Result<()> {
    // hardlink stand-ins, empty files and directories
    if desc.size == 0 || desc.is_dir() {
        return Ok(());
    }

    match desc.kind() {
        FileKind::Symlink => {
            let target = desc.link_target.as_deref().unwrap_or_default();
            if target.len() as u64 != desc.size {
                return Err(CpioError::ContentTruncated {
                    path: source.to_path_buf(),
                    expected: desc.size,
                    written: target.len() as u64,
                });
            }
            out.write_all(target)?;
        }
        FileKind::Regular => {
            let reader = fs.open(source).map_err(|e| CpioError::at(source, e))?;
            copy_exact(out, reader, desc.size, source)?;
        }
        FileKind::Directory | FileKind::Other => {
            return Err(CpioError::UnsupportedType {
                path: source.to_path_buf(),
                mode: desc.mode,
            });
        }
    }

    out.align()?;
    Ok(())
}

/// Copy exactly `expected` bytes; a short source aborts the archive.
fn copy_exact<W: Write>(
    out: &mut PaddedWriter<W>,
    reader: impl Read,
    expected: u64,
    source: &Path,
) -> Result<()> {
    let mut limited = reader.take(expected);
    let mut buf = vec![0u8; CHUNK_SIZE];
    let mut written = 0u64;

    loop {
        let n = match limited.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(CpioError::at(source, e)),
        };
        out.write_all(&buf[..n])?;
        written += n as u64;
    }

    if written < expected {
        return Err(CpioError::ContentTruncated {
            path: source.to_path_buf(),
            expected,
            written,
        });
    }
    Ok(())
}
