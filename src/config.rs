//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Memoisation coordinator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoConfig {
    /// How long an entry stays valid in the in-memory tier. Zero disables
    /// expiry.
    pub memory_ttl: Duration,

    /// Entries in the local persistent tier older than this are treated as
    /// misses and refetched from the remote.
    pub local_max_age: Duration,

    /// Namespace for the local persistent tier.
    pub namespace: String,
}

impl Default for MemoConfig {
    fn default() -> Self {
        Self {
            memory_ttl: Duration::from_secs(3600),
            local_max_age: Duration::from_secs(24 * 3600),
            namespace: "expr-memo".to_string(),
        }
    }
}
