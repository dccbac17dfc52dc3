//! # rlog-core
//!
//! why: implement single-leader log replication in pure, portable rust
//! relations: used by rlog-http, which exposes peers over a network transport
//! what: entry types, the log store, the peer capability trait, replication engine

pub mod entry;
pub mod error;
pub mod log;
pub mod message;
pub mod peer;

pub use entry::{Entry, EntryInfo};
pub use error::{FollowerFailure, LogError, PeerError, ReplicationFailure};
pub use log::{BasicLog, Log};
pub use message::Message;
pub use peer::{BasicPeer, NextIndexMap, Peer, PeerId};
