use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rlog_core::{Entry, Message, Peer};
use rlog_http::config::DEFAULT_REQUEST_TIMEOUT_MS;
use rlog_http::{node, FollowerConfig, NodeConfig, RemotePeer};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Opt {
    #[clap(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Run a peer, replicating to the given followers
    Serve {
        /// JSON node config; flags below override its values
        #[clap(long, env = "RLOG_CONFIG")]
        config: Option<PathBuf>,

        #[clap(long)]
        id: Option<u64>,

        #[clap(long)]
        host: Option<String>,

        #[clap(long)]
        port: Option<u16>,

        /// Follower as ID=URL, may be repeated
        #[clap(long = "follower", value_name = "ID=URL")]
        followers: Vec<FollowerConfig>,

        #[clap(long)]
        request_timeout_ms: Option<u64>,
    },

    /// Ask a node to replicate commands to its followers
    Send {
        #[clap(long)]
        url: String,

        #[clap(long = "command", required = true)]
        commands: Vec<String>,

        #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
        timeout_ms: u64,
    },

    /// Print a node's log and follower counts
    Status {
        #[clap(long)]
        url: String,

        #[clap(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
        timeout_ms: u64,
    },
}

fn main() -> anyhow::Result<()> {
    // Setup the logger
    tracing_subscriber::fmt()
        .with_target(true)
        .with_thread_ids(true)
        .with_level(true)
        .with_ansi(false)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = Opt::parse();

    match options.cmd {
        Command::Serve {
            config,
            id,
            host,
            port,
            followers,
            request_timeout_ms,
        } => {
            let mut node_config = match config {
                Some(path) => NodeConfig::from_file(path)?,
                None => NodeConfig::default(),
            };
            if let Some(id) = id {
                node_config.id = id;
            }
            if let Some(host) = host {
                node_config.host = host;
            }
            if let Some(port) = port {
                node_config.port = port;
            }
            if !followers.is_empty() {
                node_config.followers = followers;
            }
            if let Some(ms) = request_timeout_ms {
                node_config.request_timeout_ms = ms;
            }

            node::run(&node_config).with_context(|| format!("node {} stopped", node_config.id))?;
        }
        Command::Send {
            url,
            commands,
            timeout_ms,
        } => {
            let mut target = RemotePeer::new(0, url.clone(), Duration::from_millis(timeout_ms))?;
            let msg = Message::new(commands.into_iter().map(Entry::new).collect());
            target
                .send(&msg)
                .with_context(|| format!("send to {url} failed"))?;
            println!("replicated {} entries via {}", msg.len(), url);
        }
        Command::Status { url, timeout_ms } => {
            let target = RemotePeer::new(0, url.clone(), Duration::from_millis(timeout_ms))?;
            println!("log count: {}", target.log_count()?);
            println!("follower count: {}", target.peer_count()?);
        }
    }

    Ok(())
}
