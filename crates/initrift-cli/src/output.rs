//! Archive output sinks.
//!
//! The session writes uncompressed newc bytes; the sink decides what lands
//! on disk.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use flate2::write::GzEncoder;
use initrift_config::Compression;

pub enum ArchiveOutput {
    Plain(BufWriter<File>),
    Gzip(GzEncoder<BufWriter<File>>),
    Zstd(zstd::stream::write::Encoder<'static, BufWriter<File>>),
}

impl ArchiveOutput {
    /// Wrap `file` in the chosen codec. `level` is clamped to the codec's range.
    pub fn new(file: File, compression: Compression, level: u32) -> io::Result<Self> {
        let sink = BufWriter::new(file);
        Ok(match compression {
            Compression::None => ArchiveOutput::Plain(sink),
            Compression::Gzip => {
                ArchiveOutput::Gzip(GzEncoder::new(sink, flate2::Compression::new(level.min(9))))
            }
            Compression::Zstd => {
                let level = level.clamp(1, 22) as i32;
                ArchiveOutput::Zstd(zstd::stream::write::Encoder::new(sink, level)?)
            }
        })
    }

    /// Flush the codec trailer and the file buffer.
    pub fn finish(self) -> io::Result<()> {
        let mut sink = match self {
            ArchiveOutput::Plain(sink) => sink,
            ArchiveOutput::Gzip(encoder) => encoder.finish()?,
            ArchiveOutput::Zstd(encoder) => encoder.finish()?,
        };
        sink.flush()?;
        sink.get_ref().sync_all()
    }
}

impl Write for ArchiveOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ArchiveOutput::Plain(w) => w.write(buf),
            ArchiveOutput::Gzip(w) => w.write(buf),
            ArchiveOutput::Zstd(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ArchiveOutput::Plain(w) => w.flush(),
            ArchiveOutput::Gzip(w) => w.flush(),
            ArchiveOutput::Zstd(w) => w.flush(),
        }
    }
}
