//! # rlog-http
//!
//! why: expose rlog-core peers over http so leaders and followers can live in separate processes
//! relations: wraps rlog-core's BasicPeer on the server side, implements its Peer trait on the client side
//! what: wire types, actix-web server, reqwest RemotePeer, node configuration and bootstrap

pub mod client;
pub mod config;
pub mod node;
pub mod server;
pub mod wire;

pub use client::RemotePeer;
pub use config::{ConfigError, FollowerConfig, NodeConfig};
pub use node::NodeError;
pub use server::SharedPeer;
