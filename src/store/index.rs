//! In-memory record index
//!
//! Tracks the file position of every live record. Slots are held in file
//! order; the key map stores each slot's file offset rather than its list
//! position, so removing a slot never invalidates the map values for the
//! slots that shift down behind it.

use std::collections::HashMap;

/// Descriptor of one live record's position in the file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Slot {
    /// Byte offset of the record header within the file
    pub offset: u64,
    /// Caller-assigned record key
    pub key: i32,
    /// Stored (compressed) payload length
    pub compressed_len: u32,
}

/// Index over live records, rebuilt by a full file scan
///
/// Invariant: every key in `by_key` maps to the offset of a slot currently
/// held in `slots`, and that slot's key field matches. Tombstoned records
/// appear in neither structure.
#[derive(Debug)]
pub(crate) struct RecordIndex {
    /// Live slots in file order; offsets are strictly increasing because the
    /// scan walks forward and appends always land at end of file
    slots: Vec<Slot>,
    /// Key → file offset of that key's slot (latest wins for the sentinel key)
    by_key: HashMap<i32, u64>,
    /// Smallest live key, or `null_key` when no live record exists
    min_key: i32,
    /// Largest live key, or `null_key` when no live record exists
    max_key: i32,
    /// Sentinel "no key" value, also the reset value for min/max
    null_key: i32,
    /// Explicit materialization flag; never inferred from `slots.is_empty()`
    loaded: bool,
}

impl RecordIndex {
    pub fn new(null_key: i32) -> Self {
        Self {
            slots: Vec::new(),
            by_key: HashMap::new(),
            min_key: null_key,
            max_key: null_key,
            null_key,
            loaded: false,
        }
    }

    /// Whether the lazy file scan has run for this instance
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Mark the scan as complete
    pub fn mark_loaded(&mut self) {
        self.loaded = true;
    }

    /// Drop all index state and force a rescan on next use
    pub fn clear(&mut self) {
        self.slots.clear();
        self.by_key.clear();
        self.min_key = self.null_key;
        self.max_key = self.null_key;
        self.loaded = false;
    }

    /// Register a live record, keeping min/max and the key map current
    pub fn insert(&mut self, slot: Slot) {
        self.track_key(slot.key);
        self.by_key.insert(slot.key, slot.offset);
        self.slots.push(slot);
    }

    /// Remove the slot at `position`, returning it.
    ///
    /// The key map entry is dropped only when it points at the removed
    /// slot's offset; a later record written under the same (sentinel) key
    /// keeps its mapping. Min/max are recomputed when the removed key was
    /// on either boundary.
    pub fn remove(&mut self, position: usize) -> Slot {
        let slot = self.slots.remove(position);

        if self.by_key.get(&slot.key) == Some(&slot.offset) {
            self.by_key.remove(&slot.key);
        }

        if self.slots.is_empty() {
            self.min_key = self.null_key;
            self.max_key = self.null_key;
        } else if slot.key == self.min_key || slot.key == self.max_key {
            self.recompute_key_range();
        }

        slot
    }

    pub fn contains_key(&self, key: i32) -> bool {
        self.by_key.contains_key(&key)
    }

    /// Resolve a key to its current list position and slot
    pub fn locate_key(&self, key: i32) -> Option<(usize, Slot)> {
        let offset = *self.by_key.get(&key)?;
        let position = self
            .slots
            .binary_search_by_key(&offset, |slot| slot.offset)
            .ok()?;
        Some((position, self.slots[position]))
    }

    /// Slot at a list position, if in range
    pub fn slot_at(&self, position: usize) -> Option<Slot> {
        self.slots.get(position).copied()
    }

    /// Number of live records
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn min_key(&self) -> i32 {
        self.min_key
    }

    pub fn max_key(&self) -> i32 {
        self.max_key
    }

    /// Fold one key into the min/max scalars. A boundary equal to the
    /// sentinel is treated as "unset" and replaced outright.
    fn track_key(&mut self, key: i32) {
        if self.min_key == self.null_key {
            self.min_key = key;
        } else {
            self.min_key = self.min_key.min(key);
        }

        if self.max_key == self.null_key {
            self.max_key = key;
        } else {
            self.max_key = self.max_key.max(key);
        }
    }

    /// Rebuild min/max from the remaining slots after a boundary key left
    fn recompute_key_range(&mut self) {
        self.min_key = self.null_key;
        self.max_key = self.null_key;
        for position in 0..self.slots.len() {
            let key = self.slots[position].key;
            self.track_key(key);
        }
    }
}
