//! # error
//!
//! why: give every failure in the replication core a typed, inspectable shape
//! relations: returned by log.rs and peer.rs, mapped to http statuses by rlog-http
//! what: LogError, PeerError, ReplicationFailure, FollowerFailure

use std::fmt;

use thiserror::Error;

use crate::PeerId;

/// Errors raised by a [`Log`](crate::Log)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LogError {
    /// The index is outside `[0, count)` for reads or `[0, count]` for installs
    #[error("index {index} out of range for log of {count} entries")]
    IndexOutOfRange { index: usize, count: usize },

    /// A half-open range `[start, end)` that does not fit the log
    #[error("invalid range [{start}, {end}) for log of {count} entries")]
    RangeInvalid {
        start: usize,
        end: usize,
        count: usize,
    },
}

/// Errors raised by a [`Peer`](crate::Peer)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeerError {
    #[error(transparent)]
    Log(#[from] LogError),

    /// Followers are registered but `init` has not (successfully) run
    #[error("peer {id} is not ready: {initialized} of {followers} followers initialized")]
    PeerUnready {
        id: PeerId,
        initialized: usize,
        followers: usize,
    },

    #[error("peer {id} is not a registered follower")]
    UnknownFollower { id: PeerId },

    /// At least one follower failed during a send
    #[error("replication failed: {0}")]
    ReplicationFailed(ReplicationFailure),

    /// The peer could not be reached, timed out, or answered with garbage
    #[error("transport error talking to peer {peer}: {reason}")]
    Transport { peer: PeerId, reason: String },

    /// The peer answered but refused the request
    #[error("peer {peer} rejected the request ({status}): {message}")]
    Remote {
        peer: PeerId,
        status: u16,
        message: String,
    },
}

impl PeerError {
    pub fn transport(peer: PeerId, reason: impl fmt::Display) -> Self {
        Self::Transport {
            peer,
            reason: reason.to_string(),
        }
    }

    /// Whether repeating the same call may succeed without any other change
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::ReplicationFailed(failure) => failure.is_retryable(),
            _ => false,
        }
    }
}

/// One follower that failed during a send, with the error it produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowerFailure {
    pub id: PeerId,
    pub error: PeerError,
}

/// Per-follower outcome of a send that did not fully succeed.
///
/// Followers listed in `succeeded` already had their cursor advanced, so a
/// caller only needs to retry the ids in [`failed_ids`](Self::failed_ids).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplicationFailure {
    /// Followers that installed the batch, in registration order
    pub succeeded: Vec<PeerId>,
    /// Followers that did not, in registration order
    pub failed: Vec<FollowerFailure>,
}

impl ReplicationFailure {
    pub fn failed_ids(&self) -> Vec<PeerId> {
        self.failed.iter().map(|f| f.id).collect()
    }

    pub fn is_retryable(&self) -> bool {
        !self.failed.is_empty() && self.failed.iter().all(|f| f.error.is_retryable())
    }
}

impl fmt::Display for ReplicationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} of {} followers failed",
            self.failed.len(),
            self.failed.len() + self.succeeded.len()
        )?;
        for (i, failure) in self.failed.iter().enumerate() {
            let sep = if i == 0 { ": " } else { "; " };
            write!(f, "{}{} ({})", sep, failure.id, failure.error)?;
        }
        Ok(())
    }
}
