//! # recstore
//!
//! A minimal single-file keyed record store:
//! - Append-only binary container for variable-length byte records
//! - Each record identified by an `i32` key and compressed individually
//! - Tombstone-based logical deletion (bytes are never reclaimed)
//! - In-memory index rebuilt lazily from a full file scan
//!
//! ## File Format
//!
//! A flat sequence of records with no file-level header or footer:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ Record                                                   │
//! │ ┌────────────┬──────────┬────────────┬─────────────────┐ │
//! │ │ Deleted(4) │ Key (4)  │ Length (4) │ Payload (N)     │ │
//! │ └────────────┴──────────┴────────────┴─────────────────┘ │
//! │ ... repeated for each record ...                         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All header integers are big-endian. The payload is the zlib-compressed
//! form of the caller's data; empty payloads store `Length = 0` and
//! contribute exactly 12 bytes to the file.
//!
//! ## Usage
//!
//! ```no_run
//! use recstore::RecordStore;
//!
//! let mut store = RecordStore::new("data.rec", -1);
//! store.write_string_with_key(7, "hello").unwrap();
//! assert_eq!(store.read_string_by_key(7).unwrap(), "hello");
//! store.delete_by_key(7).unwrap();
//! store.close().unwrap();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod compress;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{Result, StoreError};
pub use store::RecordStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of recstore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
