//! Recency buffer of admitted transaction identifiers.
//!
//! The node may redeliver a confirmed transaction after a reconnect.  A
//! ring of the last [`DEDUP_CAPACITY`] admitted identifiers is enough to
//! suppress those replays: lookups are a linear scan and the oldest slot is
//! overwritten once the ring is full.

/// Number of identifiers remembered.
pub const DEDUP_CAPACITY: usize = 10;

/// Transaction hashes are 64 hex characters.  Longer identifiers are
/// refused at the frame boundary.
pub const IDENTIFIER_CAP: usize = 64;

pub struct Deduplicator {
    slots: [Option<Box<str>>; DEDUP_CAPACITY],
    cursor: usize,
}

impl Default for Deduplicator {
    fn default() -> Self {
        Self::new()
    }
}

impl Deduplicator {
    pub const fn new() -> Self {
        Self {
            slots: [const { None }; DEDUP_CAPACITY],
            cursor: 0,
        }
    }

    /// Admit `identifier` if it is not among the last ten admitted.
    ///
    /// Returns `false` for a repeat.  A novel identifier overwrites the
    /// oldest slot.  Matching is exact and case-sensitive over the whole
    /// identifier.
    pub fn admit(&mut self, identifier: &str) -> bool {
        if self.contains(identifier) {
            return false;
        }
        self.slots[self.cursor] = Some(identifier.into());
        self.cursor = (self.cursor + 1) % DEDUP_CAPACITY;
        true
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.slots.iter().flatten().any(|slot| &**slot == identifier)
    }

    /// Number of occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forget every identifier.
    pub fn reset(&mut self) {
        self.slots = [const { None }; DEDUP_CAPACITY];
        self.cursor = 0;
    }
}
