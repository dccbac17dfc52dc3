//! # client
//!
//! why: let a leader drive a follower that lives behind an http server
//! relations: implements rlog-core's Peer trait, talks to server.rs endpoints
//! what: RemotePeer

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use rlog_core::{Entry, EntryInfo, Message, Peer, PeerError, PeerId};
use serde::Serialize;

use crate::wire::{self, EntryRequest, ErrorBody};

/// A peer reached over http.
///
/// Every call is bounded by the client timeout; expiry and connection
/// failures surface as [`PeerError::Transport`], non-2xx answers as
/// [`PeerError::Remote`].
#[derive(Debug, Clone)]
pub struct RemotePeer {
    id: PeerId,
    base_url: String,
    client: Client,
}

impl RemotePeer {
    /// Must not be called from inside an async runtime.
    pub fn new(id: PeerId, base_url: impl Into<String>, timeout: Duration) -> Result<Self, PeerError> {
        let client = Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| PeerError::transport(id, e))?;

        Ok(Self {
            id,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get_count(&self, path: &str) -> Result<usize, PeerError> {
        let resp = self
            .client
            .get(self.url(path))
            .send()
            .map_err(|e| PeerError::transport(self.id, e))?;
        let body = self
            .check(resp)?
            .text()
            .map_err(|e| PeerError::transport(self.id, e))?;

        body.trim().parse().map_err(|e| {
            PeerError::transport(self.id, format!("malformed count {body:?} from {path}: {e}"))
        })
    }

    fn post<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response, PeerError> {
        let resp = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .map_err(|e| PeerError::transport(self.id, e))?;
        self.check(resp)
    }

    fn check(&self, resp: Response) -> Result<Response, PeerError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let message = match resp.json::<ErrorBody>() {
            Ok(body) => body.error,
            Err(e) => format!("unreadable error body: {e}"),
        };
        Err(PeerError::Remote {
            peer: self.id,
            status: status.as_u16(),
            message,
        })
    }
}

impl Peer for RemotePeer {
    fn id(&self) -> PeerId {
        self.id
    }

    #[tracing::instrument(level = "debug", skip_all, fields(peer = self.id, next_index = info.next_index), err)]
    fn add_entries(&mut self, info: &EntryInfo) -> Result<(), PeerError> {
        self.post(wire::LOG_ADD_ENTRIES, info)?;
        Ok(())
    }

    fn entry(&self, idx: usize) -> Result<Entry, PeerError> {
        self.post(wire::LOG_ENTRY, &EntryRequest { entry_id: idx })?
            .json()
            .map_err(|e| PeerError::transport(self.id, format!("malformed entry: {e}")))
    }

    fn log_count(&self) -> Result<usize, PeerError> {
        self.get_count(wire::LOG_COUNT)
    }

    fn peer_count(&self) -> Result<usize, PeerError> {
        self.get_count(wire::FOLLOWERS_COUNT)
    }

    /// A remote peer's followers are not visible to its caller
    fn followers(&self) -> &[Box<dyn Peer>] {
        &[]
    }

    /// Probe reachability, so an unreachable follower fails the leader's init
    fn init(&mut self) -> Result<(), PeerError> {
        self.log_count().map(|_| ())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(peer = self.id, entries = msg.len()), err)]
    fn send(&mut self, msg: &Message) -> Result<(), PeerError> {
        self.post(wire::LOG_SEND, msg)?;
        Ok(())
    }
}
