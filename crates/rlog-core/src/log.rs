//! # log
//!
//! why: store the ordered commands a peer has accepted
//! relations: owned by peer.rs (one log per peer), entries defined in entry.rs
//! what: Log trait, BasicLog in-memory implementation

use crate::{Entry, EntryInfo, LogError};

/// trait for an ordered, truncate-and-append command store
///
/// indices are dense: a log of `count()` entries holds indices `0..count()`.
/// this abstraction allows a peer to be driven by:
/// - a vec in memory (simulation, testing)
/// - any other backend that honours the same truncate semantics
pub trait Log {
    /// drop every entry at or after `info.next_index`, then append `info.entries`
    ///
    /// the caller's claim about `next_index` is trusted; nothing before it is checked.
    fn add_entries(&mut self, info: &EntryInfo) -> Result<(), LogError>;

    /// number of entries currently retained
    fn count(&self) -> usize;

    /// entry at `idx`, which must be below `count()`
    fn entry(&self, idx: usize) -> Result<Entry, LogError>;

    /// entries in the half-open range `[start, end)`
    fn entries(&self, start: usize, end: usize) -> Result<Vec<Entry>, LogError>;

    fn is_empty(&self) -> bool {
        self.count() == 0
    }
}

// -- in-memory log implementation --

/// vec-backed log, lost when the process exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BasicLog {
    backend: Vec<Entry>,
}

impl BasicLog {
    /// create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// create a log that already holds `entries`
    pub fn with_entries(entries: Vec<Entry>) -> Self {
        Self { backend: entries }
    }

    /// borrow every retained entry
    pub fn as_slice(&self) -> &[Entry] {
        &self.backend
    }
}

impl Log for BasicLog {
    fn add_entries(&mut self, info: &EntryInfo) -> Result<(), LogError> {
        let count = self.backend.len();
        if info.next_index > count {
            return Err(LogError::IndexOutOfRange {
                index: info.next_index,
                count,
            });
        }

        if info.next_index < count {
            tracing::debug!(from = info.next_index, dropped = count - info.next_index, "truncate log");
        }

        self.backend.truncate(info.next_index);
        self.backend.extend(info.entries.iter().cloned());
        Ok(())
    }

    fn count(&self) -> usize {
        self.backend.len()
    }

    fn entry(&self, idx: usize) -> Result<Entry, LogError> {
        self.backend
            .get(idx)
            .cloned()
            .ok_or(LogError::IndexOutOfRange {
                index: idx,
                count: self.backend.len(),
            })
    }

    fn entries(&self, start: usize, end: usize) -> Result<Vec<Entry>, LogError> {
        let count = self.backend.len();
        if start > end || end > count {
            return Err(LogError::RangeInvalid { start, end, count });
        }
        Ok(self.backend[start..end].to_vec())
    }
}

impl From<Vec<Entry>> for BasicLog {
    fn from(entries: Vec<Entry>) -> Self {
        Self::with_entries(entries)
    }
}
