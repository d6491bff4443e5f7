//! On-disk record header codec
//!
//! Every record starts with a fixed 12-byte header:
//!
//! ```text
//! [Deleted: u32][Key: i32][Length: u32]
//! ```
//!
//! All fields are big-endian, matching the `DataOutput`-style fixed-width
//! integer convention of the format this store interoperates with. `Length`
//! is the compressed payload length; empty records store 0 and carry no
//! payload bytes.

// =============================================================================
// Layout Constants
// =============================================================================

/// Header size: Deleted (4) + Key (4) + Length (4) = 12 bytes
pub(crate) const HEADER_SIZE: u64 = 12;

/// Deleted flag value for a live record
pub(crate) const DELETED_FALSE: u32 = 0;

/// Deleted flag value for a tombstoned record
pub(crate) const DELETED_TRUE: u32 = 1;

// =============================================================================
// Header Codec
// =============================================================================

/// Decoded form of the fixed 12-byte record header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordHeader {
    /// 0 = live, 1 = tombstoned
    pub deleted: u32,
    /// Caller-assigned record key
    pub key: i32,
    /// Compressed payload length in bytes
    pub length: u32,
}

impl RecordHeader {
    /// Header for a freshly appended live record
    pub fn live(key: i32, length: u32) -> Self {
        Self {
            deleted: DELETED_FALSE,
            key,
            length,
        }
    }

    /// Whether the record is tombstoned
    pub fn is_deleted(&self) -> bool {
        self.deleted != DELETED_FALSE
    }

    /// Encode into the on-disk big-endian layout
    pub fn encode(&self) -> [u8; HEADER_SIZE as usize] {
        let mut buf = [0u8; HEADER_SIZE as usize];
        buf[0..4].copy_from_slice(&self.deleted.to_be_bytes());
        buf[4..8].copy_from_slice(&self.key.to_be_bytes());
        buf[8..12].copy_from_slice(&self.length.to_be_bytes());
        buf
    }

    /// Decode from the on-disk big-endian layout
    pub fn decode(buf: &[u8; HEADER_SIZE as usize]) -> Self {
        Self {
            deleted: u32::from_be_bytes(buf[0..4].try_into().unwrap()),
            key: i32::from_be_bytes(buf[4..8].try_into().unwrap()),
            length: u32::from_be_bytes(buf[8..12].try_into().unwrap()),
        }
    }
}
