//! # peer
//!
//! why: define the replication actor and the capability set leaders use to reach followers
//! relations: drives log.rs, consumes message.rs, implemented remotely by rlog-http
//! what: Peer trait, BasicPeer in-process peer, NextIndexMap cursor bookkeeping

use std::collections::BTreeMap;
use std::fmt;

use crate::{
    BasicLog, Entry, EntryInfo, FollowerFailure, Log, Message, PeerError, ReplicationFailure,
};

/// Unique identifier of a peer within a cluster
pub type PeerId = u64;

/// The operations a leader may invoke on a follower.
///
/// Local and remote variants implement the same set, so the replication
/// engine never needs to know which kind of follower it is talking to.
pub trait Peer: Send {
    fn id(&self) -> PeerId;

    /// Truncate-and-append `info` into this peer's log
    fn add_entries(&mut self, info: &EntryInfo) -> Result<(), PeerError>;

    fn entry(&self, idx: usize) -> Result<Entry, PeerError>;

    fn log_count(&self) -> Result<usize, PeerError>;

    /// Number of followers registered on this peer
    fn peer_count(&self) -> Result<usize, PeerError>;

    /// Registered followers, in registration order
    fn followers(&self) -> &[Box<dyn Peer>];

    /// Snapshot every follower's log length as its replication cursor
    fn init(&mut self) -> Result<(), PeerError>;

    /// Replicate `msg` to every follower
    fn send(&mut self, msg: &Message) -> Result<(), PeerError>;
}

/// Per-follower replication cursor: the next index the leader will write to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NextIndexMap {
    cursors: BTreeMap<PeerId, usize>,
}

impl NextIndexMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: PeerId) -> Option<usize> {
        self.cursors.get(&id).copied()
    }

    pub fn set(&mut self, id: PeerId, next_index: usize) {
        self.cursors.insert(id, next_index);
    }

    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (PeerId, usize)> + '_ {
        self.cursors.iter().map(|(id, idx)| (*id, *idx))
    }
}

/// An in-process peer owning its log and, optionally, a set of followers.
///
/// A peer with no followers behaves purely as a follower. Once followers are
/// added, `init` must succeed before `send` or `add_entries` are accepted.
pub struct BasicPeer<L = BasicLog> {
    id: PeerId,
    log: L,
    followers: Vec<Box<dyn Peer>>,
    next_index: Option<NextIndexMap>,
}

impl BasicPeer<BasicLog> {
    /// Create a peer with an empty log and no followers
    pub fn new(id: PeerId) -> Self {
        Self::with_log(id, BasicLog::new())
    }
}

impl<L: Log> BasicPeer<L> {
    pub fn with_log(id: PeerId, log: L) -> Self {
        Self {
            id,
            log,
            followers: Vec::new(),
            next_index: None,
        }
    }

    /// Register a follower. No dedup is performed on ids.
    pub fn add_peer(&mut self, follower: Box<dyn Peer>) {
        tracing::debug!(peer = self.id, follower = follower.id(), "add follower");
        self.followers.push(follower);
    }

    pub fn log(&self) -> &L {
        &self.log
    }

    pub fn next_index_map(&self) -> Option<&NextIndexMap> {
        self.next_index.as_ref()
    }

    pub fn next_index(&self, follower: PeerId) -> Option<usize> {
        self.next_index.as_ref().and_then(|m| m.get(follower))
    }

    /// True once `init` has recorded a cursor for every registered follower
    pub fn is_initialized(&self) -> bool {
        self.next_index
            .as_ref()
            .is_some_and(|m| m.len() == self.followers.len())
    }

    /// Move a follower's cursor, e.g. to rewrite a log the leader no longer trusts
    pub fn set_next_index(&mut self, follower: PeerId, next_index: usize) -> Result<(), PeerError> {
        if !self.followers.iter().any(|f| f.id() == follower) {
            return Err(PeerError::UnknownFollower { id: follower });
        }
        self.ensure_ready()?;

        if let Some(map) = self.next_index.as_mut() {
            map.set(follower, next_index);
        }
        Ok(())
    }

    /// Replicate `msg` to the followers listed in `targets`.
    ///
    /// Every targeted follower is tried, in registration order, even after one
    /// fails. Successful followers have their cursor advanced; failed ones keep
    /// theirs, so retrying with the failed ids resumes where they stopped.
    pub fn send_to(&mut self, msg: &Message, targets: &[PeerId]) -> Result<(), PeerError> {
        if let Some(&id) = targets
            .iter()
            .find(|t| !self.followers.iter().any(|f| f.id() == **t))
        {
            return Err(PeerError::UnknownFollower { id });
        }
        if targets.is_empty() {
            return Ok(());
        }
        self.ensure_ready()?;

        let leader = self.id;
        // ensure_ready holds: one cursor per registered follower id
        let cursors = self.next_index.get_or_insert_with(NextIndexMap::new);

        let mut report = ReplicationFailure::default();
        for follower in self
            .followers
            .iter_mut()
            .filter(|f| targets.contains(&f.id()))
        {
            let id = follower.id();
            let cursor = cursors.get(id).unwrap_or_default();

            let info = EntryInfo::new(cursor, msg.entries.clone());
            match follower.add_entries(&info) {
                Ok(()) => {
                    tracing::debug!(peer = leader, follower = id, cursor, next = info.end_index(), "replicated");
                    cursors.set(id, info.end_index());
                    report.succeeded.push(id);
                }
                Err(error) => {
                    tracing::warn!(peer = leader, follower = id, cursor, %error, "replication to follower failed");
                    report.failed.push(FollowerFailure { id, error });
                }
            }
        }

        if report.failed.is_empty() {
            Ok(())
        } else {
            Err(PeerError::ReplicationFailed(report))
        }
    }

    fn ensure_ready(&self) -> Result<(), PeerError> {
        if self.followers.is_empty() || self.is_initialized() {
            return Ok(());
        }
        Err(PeerError::PeerUnready {
            id: self.id,
            initialized: self.next_index.as_ref().map_or(0, NextIndexMap::len),
            followers: self.followers.len(),
        })
    }
}

impl<L: Log + Send> Peer for BasicPeer<L> {
    fn id(&self) -> PeerId {
        self.id
    }

    fn add_entries(&mut self, info: &EntryInfo) -> Result<(), PeerError> {
        self.ensure_ready()?;
        self.log.add_entries(info)?;
        Ok(())
    }

    fn entry(&self, idx: usize) -> Result<Entry, PeerError> {
        Ok(self.log.entry(idx)?)
    }

    fn log_count(&self) -> Result<usize, PeerError> {
        Ok(self.log.count())
    }

    fn peer_count(&self) -> Result<usize, PeerError> {
        Ok(self.followers.len())
    }

    fn followers(&self) -> &[Box<dyn Peer>] {
        &self.followers
    }

    fn init(&mut self) -> Result<(), PeerError> {
        let mut map = NextIndexMap::new();
        for follower in &self.followers {
            match follower.log_count() {
                Ok(count) => map.set(follower.id(), count),
                Err(error) => {
                    tracing::warn!(peer = self.id, follower = follower.id(), %error, "cannot read follower log count");
                }
            }
        }

        if map.len() != self.followers.len() {
            let initialized = map.len();
            self.next_index = None;
            return Err(PeerError::PeerUnready {
                id: self.id,
                initialized,
                followers: self.followers.len(),
            });
        }

        tracing::info!(peer = self.id, followers = map.len(), "initialized");
        self.next_index = Some(map);
        Ok(())
    }

    fn send(&mut self, msg: &Message) -> Result<(), PeerError> {
        let targets: Vec<PeerId> = self.followers.iter().map(|f| f.id()).collect();
        self.send_to(msg, &targets)
    }
}

impl<L: fmt::Debug> fmt::Debug for BasicPeer<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicPeer")
            .field("id", &self.id)
            .field("log", &self.log)
            .field(
                "followers",
                &self.followers.iter().map(|p| p.id()).collect::<Vec<_>>(),
            )
            .field("next_index", &self.next_index)
            .finish()
    }
}
