//! # node
//!
//! why: wire a config into a running peer: followers, init, server
//! relations: uses config.rs, client.rs and server.rs; called by the rlog-node binary
//! what: build_peer, init_with_retry, run

use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use rlog_core::{BasicPeer, Peer, PeerError};
use thiserror::Error;

use crate::{server, ConfigError, NodeConfig, RemotePeer};

#[derive(Debug, Error)]
pub enum NodeError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Peer(#[from] PeerError),

    #[error("server failed: {0}")]
    Io(#[from] io::Error),
}

/// Create the node's peer with one remote follower per configured follower.
///
/// Must not be called from inside an async runtime.
pub fn build_peer(config: &NodeConfig) -> Result<BasicPeer, NodeError> {
    let mut peer = BasicPeer::new(config.id);
    for f in &config.followers {
        let remote = RemotePeer::new(f.id, f.url.clone(), config.request_timeout())?;
        peer.add_peer(Box::new(remote));
    }
    Ok(peer)
}

/// Run `init` until it succeeds or `retries` further attempts have failed
pub fn init_with_retry<P: Peer + ?Sized>(
    peer: &mut P,
    retries: u32,
    interval: Duration,
) -> Result<(), PeerError> {
    let mut attempt = 0;
    loop {
        match peer.init() {
            Ok(()) => return Ok(()),
            Err(e) if attempt < retries => {
                attempt += 1;
                tracing::warn!(peer = peer.id(), attempt, retries, %e, "init failed, retrying");
                thread::sleep(interval);
            }
            Err(e) => return Err(e),
        }
    }
}

/// Build, initialize and serve a node until its server stops
pub fn run(config: &NodeConfig) -> Result<(), NodeError> {
    config.validate()?;

    let mut peer = build_peer(config)?;
    init_with_retry(&mut peer, config.init_retries, config.init_retry_interval())?;

    // Held here so the peer and its http clients are dropped outside the server runtime.
    let shared = Arc::new(Mutex::new(peer));
    tracing::info!(id = config.id, url = %config.url(), followers = config.followers.len(), "starting node");
    actix_web::rt::System::new().block_on(server::serve(shared.clone(), config.bind_addr()))?;
    Ok(())
}
