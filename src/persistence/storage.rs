//! Storage back-ends for serialized index snapshots. Anything implementing
//! `Read + Write` qualifies; [`MemoryBackend`] is the in-process scratch
//! backend used by tests and by hosts that want to ship bytes over the wire
//! rather than touch a filesystem.

use std::io::{Cursor, Read, Result as IoResult, Write};

/// Marker trait for snapshot storage back-ends.
pub trait StorageBackend: Read + Write {}
impl<T: Read + Write> StorageBackend for T {}

/// An in-memory snapshot backend, handy for round-trip tests and for hosts
/// embedding the index without a filesystem (e.g. a browser/edge runtime).
#[derive(Debug, Default)]
pub struct MemoryBackend {
    cursor: Cursor<Vec<u8>>,
}

impl MemoryBackend {
    /// An empty backend ready to be written to.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap existing bytes for reading.
    #[must_use]
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    /// Consume the backend, returning the written bytes.
    #[must_use]
    pub fn into_inner(self) -> Vec<u8> {
        self.cursor.into_inner()
    }
}

impl Read for MemoryBackend {
    fn read(&mut self, buf: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(buf)
    }
}

impl Write for MemoryBackend {
    fn write(&mut self, buf: &[u8]) -> IoResult<usize> {
        self.cursor.write(buf)
    }

    fn flush(&mut self) -> IoResult<()> {
        self.cursor.flush()
    }
}
