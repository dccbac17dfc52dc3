//! # config
//!
//! why: describe one node of a cluster: who it is, where it listens, whom it leads
//! relations: read by node.rs and the rlog-node binary
//! what: NodeConfig, FollowerConfig, ConfigError

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use rlog_core::PeerId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SCHEME: &str = "http";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 2000;
pub const DEFAULT_INIT_RETRIES: u32 = 10;
pub const DEFAULT_INIT_RETRY_INTERVAL_MS: u64 = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("cannot parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid follower {0:?}, expected ID=URL")]
    BadFollower(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// A follower this node replicates to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerConfig {
    pub id: PeerId,
    /// Base url of the follower's server, e.g. `http://127.0.0.1:8081`
    pub url: String,
}

/// Parses the `ID=URL` form used on the command line
impl FromStr for FollowerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, url) = s
            .split_once('=')
            .ok_or_else(|| ConfigError::BadFollower(s.to_string()))?;
        let id = id
            .trim()
            .parse()
            .map_err(|_| ConfigError::BadFollower(s.to_string()))?;
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::BadFollower(s.to_string()));
        }
        Ok(Self {
            id,
            url: url.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub id: PeerId,
    pub host: String,
    pub port: u16,
    pub scheme: String,
    pub followers: Vec<FollowerConfig>,
    /// Deadline for every call to a follower
    pub request_timeout_ms: u64,
    /// How many times `init` is repeated while followers come up
    pub init_retries: u32,
    pub init_retry_interval_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            id: 0,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            scheme: DEFAULT_SCHEME.to_string(),
            followers: Vec::new(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            init_retries: DEFAULT_INIT_RETRIES,
            init_retry_interval_ms: DEFAULT_INIT_RETRY_INTERVAL_MS,
        }
    }
}

impl NodeConfig {
    /// Load a json config; absent fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Invalid("port must be non-zero".into()));
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("request_timeout_ms must be non-zero".into()));
        }
        if let Some(f) = self.followers.iter().find(|f| f.id == self.id) {
            return Err(ConfigError::Invalid(format!(
                "follower {} at {} has the node's own id",
                f.id, f.url
            )));
        }
        Ok(())
    }

    /// `scheme://host:port` of this node's own server
    pub fn url(&self) -> String {
        format!("{}://{}:{}", self.scheme, self.host, self.port)
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn init_retry_interval(&self) -> Duration {
        Duration::from_millis(self.init_retry_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = NodeConfig::default();
        config.validate().unwrap();
        assert_eq!(config.url(), "http://127.0.0.1:8080");
        assert_eq!(config.request_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"id": 1, "port": 9001, "followers": [{{"id": 2, "url": "http://127.0.0.1:9002"}}]}}"#
        )
        .unwrap();

        let config = NodeConfig::from_file(file.path()).unwrap();

        assert_eq!(config.id, 1);
        assert_eq!(config.port, 9001);
        assert_eq!(config.host, DEFAULT_HOST);
        assert_eq!(config.init_retries, DEFAULT_INIT_RETRIES);
        assert_eq!(
            config.followers,
            vec![FollowerConfig {
                id: 2,
                url: "http://127.0.0.1:9002".into()
            }]
        );
    }

    #[test]
    fn unparsable_file_is_reported_with_its_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = NodeConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains(&file.path().display().to_string()));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NodeConfig::from_file(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn follower_with_own_id_is_rejected() {
        let config = NodeConfig {
            id: 1,
            followers: vec![FollowerConfig {
                id: 1,
                url: "http://x".into(),
            }],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = NodeConfig {
            request_timeout_ms: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn follower_parses_from_cli_form() {
        let f: FollowerConfig = "2=http://127.0.0.1:8082".parse().unwrap();
        assert_eq!(f.id, 2);
        assert_eq!(f.url, "http://127.0.0.1:8082");

        assert!("http://127.0.0.1:8082".parse::<FollowerConfig>().is_err());
        assert!("x=http://a".parse::<FollowerConfig>().is_err());
        assert!("3=".parse::<FollowerConfig>().is_err());
    }
}
