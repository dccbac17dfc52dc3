//! # entry
//!
//! why: define the unit of replication and the positioned batch that installs it
//! relations: stored by log.rs, produced by peer.rs during fan-out, serialized by rlog-http
//! what: Entry, EntryInfo

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single opaque command in the replicated log.
///
/// The position of an entry is implied by its offset in the owning log and is
/// never stored on the entry itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Entry {
    /// The command to be applied by whoever consumes the log
    pub command: String,
}

impl Entry {
    /// Create a new entry carrying `command`
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl fmt::Display for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)
    }
}

/// Install `entries` starting at `next_index`, discarding whatever the log
/// held at or after that index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EntryInfo {
    pub next_index: usize,
    pub entries: Vec<Entry>,
}

impl EntryInfo {
    pub fn new(next_index: usize, entries: Vec<Entry>) -> Self {
        Self {
            next_index,
            entries,
        }
    }

    /// Index one past the last entry once this batch is installed
    pub fn end_index(&self) -> usize {
        self.next_index + self.entries.len()
    }

    /// Comma separated commands, used when reporting a rejected batch
    pub fn commands(&self) -> String {
        crate::message::join_commands(&self.entries)
    }
}
