//! Compression boundary
//!
//! Record payloads pass through a zlib encode/decode pair on their way to
//! and from disk. The store treats this as an opaque byte-transform pair;
//! swapping the scheme means replacing this one module, with the caveat that
//! existing files stay readable only with the scheme that wrote them.

use std::io::Write;

use flate2::write::{ZlibDecoder, ZlibEncoder};
use flate2::Compression;

use crate::error::{Result, StoreError};

/// Compress a payload for storage.
pub fn compress(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len()), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}

/// Decompress a stored payload.
///
/// Corrupt or truncated input surfaces as [`StoreError::Decompression`].
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(Vec::with_capacity(data.len().saturating_mul(2)));
    decoder
        .write_all(data)
        .map_err(|e| StoreError::Decompression(e.to_string()))?;
    decoder
        .finish()
        .map_err(|e| StoreError::Decompression(e.to_string()))
}
