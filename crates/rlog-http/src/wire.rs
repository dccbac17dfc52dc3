//! # wire
//!
//! why: keep the endpoint paths and non-core json bodies in one place
//! relations: shared by server.rs and client.rs
//! what: endpoint paths, EntryRequest, ErrorBody

use serde::{Deserialize, Serialize};

pub const FOLLOWERS_COUNT: &str = "/followers/count";
pub const LOG_COUNT: &str = "/log/count";
pub const LOG_ENTRY: &str = "/log/entry";
pub const LOG_ADD_ENTRIES: &str = "/log/addEntries";
pub const LOG_SEND: &str = "/log/send";

/// Body of a `/log/entry` request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRequest {
    #[serde(rename = "EntryId")]
    pub entry_id: usize,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
