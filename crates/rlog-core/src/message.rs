//! # message
//!
//! why: define the leader-issued proposal that clients hand to a peer
//! relations: consumed by peer.rs send, serialized by rlog-http for /log/send
//! what: Message

use serde::{Deserialize, Serialize};

use crate::Entry;

/// An ordered batch of entries to replicate to every follower.
///
/// Order matters: entries land on consecutive indices in the given order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Message {
    pub entries: Vec<Entry>,
}

impl Message {
    pub fn new(entries: Vec<Entry>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comma separated commands, used when reporting a rejected batch
    pub fn commands(&self) -> String {
        join_commands(&self.entries)
    }
}

impl From<Vec<Entry>> for Message {
    fn from(entries: Vec<Entry>) -> Self {
        Self::new(entries)
    }
}

pub(crate) fn join_commands(entries: &[Entry]) -> String {
    entries
        .iter()
        .map(|e| e.command.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
