use serde::{Deserialize, Serialize};

/// Exactly one of `key` or `prefix`, or neither to clear everything.
#[derive(Debug, Deserialize)]
pub struct InvalidateCacheQuery {
    pub key: Option<String>,
    pub prefix: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RemovedResponse {
    pub removed: usize,
}
