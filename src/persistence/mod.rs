//! Serialization (§4.J): file header, length-prefixed parameter JSON, label
//! table, vector store, per-layer graph store, entry-point record, footer
//! JSON, and a trailing CRC32 checksum over everything preceding it.
//!
//! The label table is framed exactly as specified (`count` then `count`
//! raw little-endian `u64` labels). The vector store and graph-layer
//! sections are each one length-prefixed `serde_json` blob rather than a
//! hand-packed byte layout — both types already derive `Serialize`/
//! `Deserialize` faithfully (including the flat/compressed graph distinction
//! per layer), so this satisfies the round-trip and `IncompatibleIndex`
//! contracts without a second, parallel byte-level schema to keep in sync.

/// Fixed file header.
pub mod header;
/// Storage back-ends (`MemoryBackend`, the `StorageBackend` blanket trait).
pub mod storage;

use std::io::{Read, Write};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub use header::{FileHeader, FORMAT_VERSION, MAGIC};
pub use storage::{MemoryBackend, StorageBackend};

use crate::graph::GraphStore;
use crate::hnsw::HierarchicalIndex;
use crate::label::LabelTable;
use crate::params::BuildParams;
use crate::storage::VectorStore;

/// Errors raised by serialization/deserialization.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed or truncated section content.
    #[error("corrupted data: {0}")]
    Corrupted(String),

    /// Trailing CRC32 did not match the computed checksum.
    #[error("checksum mismatch: expected {expected:#x}, got {actual:#x}")]
    ChecksumMismatch {
        /// Checksum stored in the file.
        expected: u32,
        /// Checksum computed while reading.
        actual: u32,
    },

    /// File header magic did not match.
    #[error("invalid magic number")]
    InvalidMagic {
        /// Expected magic bytes.
        expected: [u8; 8],
        /// Actual magic bytes read.
        actual: [u8; 8],
    },

    /// The reader ran out of bytes mid-section.
    #[error("truncated data: expected more bytes")]
    TruncatedData,

    /// The footer's parameter tree did not match the caller's constructor parameters.
    #[error("incompatible index parameters: {0}")]
    IncompatibleParams(String),

    /// A section failed to serialize.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

fn write_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_u64(buf: &mut Vec<u8>, v: u64) {
    buf.extend_from_slice(&v.to_le_bytes());
}

fn write_len_prefixed(buf: &mut Vec<u8>, bytes: &[u8]) {
    write_u32(buf, bytes.len() as u32);
    buf.extend_from_slice(bytes);
}

fn write_len_prefixed_json<T: Serialize>(buf: &mut Vec<u8>, value: &T) -> Result<(), PersistenceError> {
    let bytes = serde_json::to_vec(value).map_err(|e| PersistenceError::SerializationError(e.to_string()))?;
    write_len_prefixed(buf, &bytes);
    Ok(())
}

struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], PersistenceError> {
        if self.pos + n > self.bytes.len() {
            return Err(PersistenceError::TruncatedData);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u32(&mut self) -> Result<u32, PersistenceError> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn read_u64(&mut self) -> Result<u64, PersistenceError> {
        let b = self.take(8)?;
        Ok(u64::from_le_bytes(b.try_into().expect("exactly 8 bytes")))
    }

    fn read_len_prefixed(&mut self) -> Result<&'a [u8], PersistenceError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn read_len_prefixed_json<T: DeserializeOwned>(&mut self) -> Result<T, PersistenceError> {
        let bytes = self.read_len_prefixed()?;
        serde_json::from_slice(bytes).map_err(|e| PersistenceError::Corrupted(e.to_string()))
    }
}

/// Serialize `index` to `writer` per §4.J, including the trailing CRC32 footer.
pub fn write_index(index: &HierarchicalIndex, writer: &mut impl Write) -> Result<(), PersistenceError> {
    let mut buf = Vec::new();

    let header = FileHeader::current();
    buf.extend_from_slice(bytemuck::bytes_of(&header));

    write_len_prefixed_json(&mut buf, index.params())?;

    {
        let labels = index.labels().read();
        write_u32(&mut buf, labels.len() as u32);
        for &label in labels.inverse_slice() {
            write_u64(&mut buf, label);
        }
    }

    {
        let store = index.store().read();
        write_len_prefixed_json(&mut buf, &*store)?;
    }

    {
        let graph = index.graph().read();
        write_u32(&mut buf, graph.len() as u32);
        write_len_prefixed_json(&mut buf, &*graph)?;
    }

    let snap = index.topology().snapshot();
    let (ep_id, ep_level) = snap.entry_point.unwrap_or((0, 0));
    write_u32(&mut buf, ep_id);
    buf.extend_from_slice(&ep_level.to_le_bytes());
    buf.push(u8::from(snap.entry_point.is_some()));

    write_len_prefixed_json(&mut buf, &index.params().metadata())?;

    let checksum = crc32fast::hash(&buf);
    writer.write_all(&buf)?;
    writer.write_all(&checksum.to_le_bytes())?;
    Ok(())
}

/// Deserialize an index from `reader`, rejecting it with
/// [`PersistenceError::IncompatibleParams`] if its stored build parameters
/// don't match `expected` (§6 "IncompatibleIndex").
pub fn read_index(reader: &mut impl Read, expected: &BuildParams) -> Result<HierarchicalIndex, PersistenceError> {
    let mut all = Vec::new();
    reader.read_to_end(&mut all)?;
    if all.len() < 4 {
        return Err(PersistenceError::TruncatedData);
    }
    let (body, checksum_bytes) = all.split_at(all.len() - 4);
    let stored_checksum = u32::from_le_bytes(checksum_bytes.try_into().expect("exactly 4 bytes"));
    let actual_checksum = crc32fast::hash(body);
    if stored_checksum != actual_checksum {
        return Err(PersistenceError::ChecksumMismatch {
            expected: stored_checksum,
            actual: actual_checksum,
        });
    }

    let mut r = ByteReader::new(body);
    let header_bytes = r.take(std::mem::size_of::<FileHeader>())?;
    let header: &FileHeader = bytemuck::try_from_bytes(header_bytes)
        .map_err(|_| PersistenceError::Corrupted("malformed file header".to_string()))?;
    if header.magic != MAGIC {
        return Err(PersistenceError::InvalidMagic {
            expected: MAGIC,
            actual: header.magic,
        });
    }
    if header.format_version != FORMAT_VERSION {
        return Err(PersistenceError::Corrupted(format!(
            "unsupported format version {}",
            header.format_version
        )));
    }

    let params: BuildParams = r.read_len_prefixed_json()?;

    let label_count = r.read_u32()? as usize;
    let mut inverse = Vec::with_capacity(label_count);
    for _ in 0..label_count {
        inverse.push(r.read_u64()?);
    }
    let labels = LabelTable::from_inverse(inverse);

    let store: VectorStore = r.read_len_prefixed_json()?;

    let layer_count = r.read_u32()?;
    let graph: Vec<GraphStore> = r.read_len_prefixed_json()?;

    let ep_id = r.read_u32()?;
    let ep_level_bytes = r.take(2)?;
    let ep_level = u16::from_le_bytes(ep_level_bytes.try_into().expect("exactly 2 bytes"));
    let has_entry = r.take(1)?[0] != 0;

    let footer_metadata: serde_json::Value = r.read_len_prefixed_json()?;
    if footer_metadata != expected.metadata() {
        return Err(PersistenceError::IncompatibleParams(
            "stored build parameters do not match the constructor's".to_string(),
        ));
    }

    Ok(HierarchicalIndex::from_parts(
        params,
        labels,
        store,
        graph,
        has_entry.then_some((ep_id, ep_level)),
        layer_count as u16,
        expected.seed,
    ))
}
