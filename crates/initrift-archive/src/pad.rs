//! Output position tracking and 4-byte record alignment.
//!
//! The sink may be a one-way compressing stream, so the position is counted
//! from bytes written and never queried with a seek.

use std::io::{self, Write};

const ZEROS: [u8; 3] = [0; 3];

/// Number of NUL bytes that bring `position` to a multiple of 4.
pub const fn padding_for(position: u64) -> usize {
    ((4 - position % 4) % 4) as usize
}

/// A writer that counts the bytes it forwards.
#[derive(Debug)]
pub struct PaddedWriter<W> {
    inner: W,
    position: u64,
}

impl<W: Write> PaddedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner, position: 0 }
    }

    /// Bytes written so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Pad with NUL bytes up to the next 4-byte boundary.
    pub fn align(&mut self) -> io::Result<usize> {
        let pad = padding_for(self.position);
        if pad > 0 {
            self.write_all(&ZEROS[..pad])?;
        }
        Ok(pad)
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for PaddedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.position += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
