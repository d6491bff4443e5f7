//! Record store engine
//!
//! [`RecordStore`] wraps one binary file holding an append-only sequence of
//! compressed records, plus an in-memory index over the live ones.
//!
//! ## Responsibilities
//! - Append records (header + compressed payload) at end of file
//! - Rebuild the index lazily from a full header scan
//! - Serve key and position lookups from the index, payload bytes from disk
//! - Tombstone deletions with a single 4-byte in-place write
//!
//! ## Concurrency Model
//! Single-threaded, synchronous, blocking I/O. Every operation takes
//! `&mut self`, which statically enforces the single-writer assumption;
//! callers needing shared access must add their own external lock. The store
//! keeps two lazily opened file handles (read-only and read-write) for its
//! whole lifetime and releases both on [`RecordStore::close`] or drop.

mod header;
mod index;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::compress;
use crate::error::{Result, StoreError};

use header::{RecordHeader, DELETED_TRUE, HEADER_SIZE};
use index::{RecordIndex, Slot};

/// Single-file keyed record store
///
/// Construction never touches the file; the backing file is created by the
/// first write and scanned by the first operation that needs the index.
pub struct RecordStore {
    /// Path of the backing file (may not exist until the first write)
    path: PathBuf,
    /// Sentinel key meaning "no explicit key"; writes under it skip the
    /// duplicate-key check
    null_key: i32,
    /// Read-only handle, opened lazily on first scan/read
    reader: Option<File>,
    /// Read-write handle, opened lazily on first append/tombstone
    writer: Option<File>,
    /// In-memory index over live records
    index: RecordIndex,
    /// Set by `close()`; every later operation fails fast with `Closed`
    closed: bool,
}

impl RecordStore {
    /// Create a store over `path` with the given sentinel key.
    ///
    /// Does not open or create the file.
    pub fn new(path: impl Into<PathBuf>, null_key: i32) -> Self {
        Self {
            path: path.into(),
            null_key,
            reader: None,
            writer: None,
            index: RecordIndex::new(null_key),
            closed: false,
        }
    }

    // =========================================================================
    // Write Operations
    // =========================================================================

    /// Append a record under the sentinel key.
    pub fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.write_record_with_key(self.null_key, bytes)
    }

    /// Append a record under an explicit key.
    ///
    /// Keys are unique among live records only: writing a non-sentinel key
    /// that is currently live fails with [`StoreError::DuplicateKey`], while
    /// a deleted key may be reused. Empty input stores a 12-byte record with
    /// `length = 0` and never calls the compressor.
    pub fn write_record_with_key(&mut self, key: i32, bytes: &[u8]) -> Result<()> {
        self.check_open()?;
        self.ensure_loaded()?;

        if key != self.null_key && self.index.contains_key(key) {
            return Err(StoreError::DuplicateKey { key });
        }

        let packed = if bytes.is_empty() {
            Vec::new()
        } else {
            compress::compress(bytes)?
        };

        let header = RecordHeader::live(key, packed.len() as u32);
        let mut buf = Vec::with_capacity(HEADER_SIZE as usize + packed.len());
        buf.extend_from_slice(&header.encode());
        buf.extend_from_slice(&packed);

        // Single append: the slot is registered only after the file write
        // succeeds, so a failed write leaves the index untouched.
        let file = self.writer()?;
        let offset = file.seek(SeekFrom::End(0))?;
        file.write_all(&buf)?;

        self.index.insert(Slot {
            offset,
            key,
            compressed_len: header.length,
        });

        tracing::trace!(
            "appended record key [{}] at offset {} ({} compressed bytes)",
            key,
            offset,
            header.length
        );

        Ok(())
    }

    /// Append a UTF-8 string under the sentinel key.
    pub fn write_string(&mut self, text: &str) -> Result<()> {
        self.write_record(text.as_bytes())
    }

    /// Append a UTF-8 string under an explicit key.
    pub fn write_string_with_key(&mut self, key: i32, text: &str) -> Result<()> {
        self.write_record_with_key(key, text.as_bytes())
    }

    /// Serialize a value with bincode and append it under the sentinel key.
    pub fn write_object<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.write_object_with_key(self.null_key, value)
    }

    /// Serialize a value with bincode and append it under an explicit key.
    pub fn write_object_with_key<T: Serialize>(&mut self, key: i32, value: &T) -> Result<()> {
        let bytes =
            bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.write_record_with_key(key, &bytes)
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Whether a live record with `key` exists.
    pub fn contains_key(&mut self, key: i32) -> Result<bool> {
        self.check_open()?;
        self.ensure_loaded()?;
        Ok(self.index.contains_key(key))
    }

    /// Read and decompress the record stored under `key`.
    pub fn read_record_by_key(&mut self, key: i32) -> Result<Vec<u8>> {
        self.check_open()?;
        self.ensure_loaded()?;

        let (_, slot) = self
            .index
            .locate_key(key)
            .ok_or(StoreError::KeyNotFound { key })?;

        self.read_payload(slot).map_err(|e| match e {
            StoreError::Decompression(detail) => {
                StoreError::Decompression(format!("record key [{key}]: {detail}"))
            }
            other => other,
        })
    }

    /// Read and decompress the record at list `position` (file order among
    /// live records).
    pub fn read_record_by_position(&mut self, position: usize) -> Result<Vec<u8>> {
        self.check_open()?;
        self.ensure_loaded()?;

        let slot = self.slot_at(position)?;

        self.read_payload(slot).map_err(|e| match e {
            StoreError::Decompression(detail) => {
                StoreError::Decompression(format!("record position [{position}]: {detail}"))
            }
            other => other,
        })
    }

    /// Read the record under `key` as a UTF-8 string.
    pub fn read_string_by_key(&mut self, key: i32) -> Result<String> {
        let bytes = self.read_record_by_key(key)?;
        String::from_utf8(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read the record at `position` as a UTF-8 string.
    pub fn read_string_by_position(&mut self, position: usize) -> Result<String> {
        let bytes = self.read_record_by_position(position)?;
        String::from_utf8(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read and bincode-decode the record under `key`.
    pub fn read_object_by_key<T: DeserializeOwned>(&mut self, key: i32) -> Result<T> {
        let bytes = self.read_record_by_key(key)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read and bincode-decode the record at `position`.
    pub fn read_object_by_position<T: DeserializeOwned>(&mut self, position: usize) -> Result<T> {
        let bytes = self.read_record_by_position(position)?;
        bincode::deserialize(&bytes).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    // =========================================================================
    // Delete Operations
    // =========================================================================

    /// Tombstone the record stored under `key`.
    ///
    /// Writes the 4-byte deleted flag in place; the record's bytes stay in
    /// the file and are never reclaimed. Positions of later records shift
    /// down by one.
    pub fn delete_by_key(&mut self, key: i32) -> Result<()> {
        self.check_open()?;
        self.ensure_loaded()?;

        let (position, slot) = self
            .index
            .locate_key(key)
            .ok_or(StoreError::KeyNotFound { key })?;

        self.tombstone(position, slot)
    }

    /// Tombstone the record at list `position`.
    pub fn delete_by_position(&mut self, position: usize) -> Result<()> {
        self.check_open()?;
        self.ensure_loaded()?;

        let slot = self.slot_at(position)?;
        self.tombstone(position, slot)
    }

    // =========================================================================
    // Index Accessors
    // =========================================================================

    /// Number of live records.
    pub fn record_count(&mut self) -> Result<usize> {
        self.check_open()?;
        self.ensure_loaded()?;
        Ok(self.index.len())
    }

    /// Smallest live key, or the sentinel when no live record exists.
    pub fn min_key(&mut self) -> Result<i32> {
        self.check_open()?;
        self.ensure_loaded()?;
        Ok(self.index.min_key())
    }

    /// Largest live key, or the sentinel when no live record exists.
    pub fn max_key(&mut self) -> Result<i32> {
        self.check_open()?;
        self.ensure_loaded()?;
        Ok(self.index.max_key())
    }

    /// Drop the in-memory index and force a full rescan on the next
    /// operation. The only way to pick up records appended to the file from
    /// outside this instance.
    pub fn invalidate(&mut self) {
        self.index.clear();
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The sentinel "no key" value this store was constructed with.
    pub fn null_key(&self) -> i32 {
        self.null_key
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Release both file handles and clear the index.
    ///
    /// Pending writes are synced to disk before the write handle is dropped.
    /// Every operation after `close()` fails fast with
    /// [`StoreError::Closed`]; closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        if let Some(writer) = self.writer.take() {
            writer.sync_all()?;
        }
        self.reader = None;
        self.index.clear();
        self.closed = true;

        tracing::debug!("closed record store at {}", self.path.display());

        Ok(())
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Fail fast once the store has been closed.
    fn check_open(&self) -> Result<()> {
        if self.closed {
            Err(StoreError::Closed)
        } else {
            Ok(())
        }
    }

    /// Lazily open the read-only handle.
    fn reader(&mut self) -> Result<&mut File> {
        let file = match self.reader.take() {
            Some(file) => file,
            None => File::open(&self.path)?,
        };
        Ok(self.reader.insert(file))
    }

    /// Lazily open the read-write handle, creating the file if needed.
    fn writer(&mut self) -> Result<&mut File> {
        let file = match self.writer.take() {
            Some(file) => file,
            None => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .open(&self.path)?,
        };
        Ok(self.writer.insert(file))
    }

    /// Materialize the index with a full header scan, once per instance.
    ///
    /// Walks the file from offset 0, reading each 12-byte header as one
    /// contiguous block and seeking over the payload. Live records become
    /// slots; tombstones are skipped but still advance the cursor by
    /// `12 + length`. A missing file loads as an empty index.
    fn ensure_loaded(&mut self) -> Result<()> {
        if self.index.is_loaded() {
            return Ok(());
        }

        self.index.clear();

        if self.path.exists() {
            if self.reader.is_none() {
                self.reader = Some(File::open(&self.path)?);
            }

            // Disjoint borrows: the scan reads through the handle while
            // inserting into the index.
            let Self {
                reader,
                index,
                path,
                ..
            } = self;
            if let Some(file) = reader.as_mut() {
                let file_len = file.metadata()?.len();
                file.seek(SeekFrom::Start(0))?;

                let mut offset = 0u64;
                let mut tombstones = 0usize;
                let mut buf = [0u8; HEADER_SIZE as usize];

                while offset < file_len {
                    file.read_exact(&mut buf)?;
                    let header = RecordHeader::decode(&buf);

                    if header.is_deleted() {
                        tombstones += 1;
                    } else {
                        index.insert(Slot {
                            offset,
                            key: header.key,
                            compressed_len: header.length,
                        });
                    }

                    offset += HEADER_SIZE + u64::from(header.length);
                    if header.length > 0 {
                        file.seek(SeekFrom::Start(offset))?;
                    }
                }

                tracing::debug!(
                    "index scan of {}: {} live records, {} tombstones",
                    path.display(),
                    index.len(),
                    tombstones
                );
            }
        }

        self.index.mark_loaded();

        Ok(())
    }

    /// Resolve a list position or fail with the out-of-range error.
    fn slot_at(&self, position: usize) -> Result<Slot> {
        self.index
            .slot_at(position)
            .ok_or(StoreError::PositionOutOfRange {
                position,
                last: self.index.len() as i64 - 1,
            })
    }

    /// Read and decompress one slot's payload bytes.
    fn read_payload(&mut self, slot: Slot) -> Result<Vec<u8>> {
        if slot.compressed_len == 0 {
            return Ok(Vec::new());
        }

        let file = self.reader()?;
        file.seek(SeekFrom::Start(slot.offset + HEADER_SIZE))?;

        let mut packed = vec![0u8; slot.compressed_len as usize];
        file.read_exact(&mut packed)?;

        compress::decompress(&packed)
    }

    /// Flip the deleted flag of one record and drop it from the index.
    fn tombstone(&mut self, position: usize, slot: Slot) -> Result<()> {
        let file = self.writer()?;
        file.seek(SeekFrom::Start(slot.offset))?;
        file.write_all(&DELETED_TRUE.to_be_bytes())?;

        self.index.remove(position);

        tracing::debug!(
            "tombstoned record key [{}] at offset {}",
            slot.key,
            slot.offset
        );

        Ok(())
    }
}
