//! Fixed-layout file header (§4.J item 1): 8-byte magic, 4-byte format
//! version, 4-byte reserved. A `bytemuck` POD struct, matching the template's
//! preference for plain fixed-size records over hand-rolled byte offsets.

use bytemuck::{Pod, Zeroable};

/// File magic identifying a serialized index snapshot.
pub const MAGIC: [u8; 8] = *b"HNSWIDX1";

/// Current on-disk format version. Bumped on any incompatible layout change.
pub const FORMAT_VERSION: u32 = 1;

/// The 16-byte fixed header at the start of every serialized index.
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
#[repr(C)]
pub struct FileHeader {
    /// Must equal [`MAGIC`].
    pub magic: [u8; 8],
    /// Must equal [`FORMAT_VERSION`] for this crate version to read the file.
    pub format_version: u32,
    /// Reserved for future use; always zero today.
    pub reserved: u32,
}

const _: () = assert!(core::mem::size_of::<FileHeader>() == 16);

impl FileHeader {
    /// The header for a file written by this crate version.
    #[must_use]
    pub fn current() -> Self {
        Self {
            magic: MAGIC,
            format_version: FORMAT_VERSION,
            reserved: 0,
        }
    }
}
