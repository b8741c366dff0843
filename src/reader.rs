//! Seekable host stream exposed as the engine's pull-style reader.

use std::io::{self, Read, Seek, SeekFrom};

use crate::engine::{EngineReader, GrowStatus};

/// Any seekable byte source a host can hand to a load call.
pub trait ByteStream: Read + Seek {}

impl<T: Read + Seek + ?Sized> ByteStream for T {}

/// Adapts a [`ByteStream`] to [`EngineReader`].
///
/// The source is treated as fixed-length: its length is captured once at
/// construction and growth queries are answered from that value. One
/// adapter serves exactly one decode call.
pub struct ReaderAdapter<'a> {
    stream: &'a mut dyn ByteStream,
    len: u64,
}

impl<'a> ReaderAdapter<'a> {
    /// Wrap `stream`, measuring the bytes available from its current
    /// position. The cursor is left where it was.
    pub fn new(stream: &'a mut dyn ByteStream) -> io::Result<Self> {
        let start = stream.stream_position()?;
        let end = stream.seek(SeekFrom::End(0))?;
        stream.seek(SeekFrom::Start(start))?;
        Ok(Self {
            stream,
            len: end.saturating_sub(start),
        })
    }

    /// Length captured at construction.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl EngineReader for ReaderAdapter<'_> {
    fn position(&mut self) -> io::Result<u64> {
        self.stream.stream_position()
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<()> {
        self.stream.read_exact(buf)
    }

    fn seek(&mut self, position: u64) -> io::Result<()> {
        self.stream.seek(SeekFrom::Start(position)).map(|_| ())
    }

    fn wait_for_file_size(&mut self, target_size: u64) -> GrowStatus {
        if target_size > self.len {
            GrowStatus::SizeBeyondEof
        } else {
            GrowStatus::SizeReached
        }
    }
}
