//! Expression result memoisation.
//!
//! A three-tier cache for computed expression payloads: a process-wide
//! in-memory map in front of an injected persistent store, with an injected
//! remote source as the authoritative fallback. Concurrent requests for the
//! same unresolved key coalesce into a single underlying fetch
//! ([`coordinator::MemoCoordinator`]).

pub mod coordinator;
pub mod store;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use coordinator::MemoCoordinator;
pub use store::{FileMemoStore, InMemoryMemoStore, MemoStore, RemoteMemoSource, StoreError};

/// One memoised expression result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: String,
    pub payload: Vec<u8>,
    pub memoised_at_unix_sec: f64,
    pub last_read_at_unix_sec: Option<f64>,
    pub scan_id: String,
    pub quant_id: String,
    pub expr_id: String,
}

/// The scan/quant/expression fingerprint a cache entry was computed for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub scan_id: String,
    pub quant_id: String,
    pub expr_id: String,
}

impl EntryMeta {
    pub fn new(
        scan_id: impl Into<String>,
        quant_id: impl Into<String>,
        expr_id: impl Into<String>,
    ) -> Self {
        Self {
            scan_id: scan_id.into(),
            quant_id: quant_id.into(),
            expr_id: expr_id.into(),
        }
    }
}

/// Builds the canonical cache key for an expression result.
pub fn expression_cache_key(meta: &EntryMeta) -> String {
    format!("expr-{}-{}-{}", meta.expr_id, meta.scan_id, meta.quant_id)
}

/// Errors from memoisation operations.
///
/// Clone so one result can fan out to every coalesced waiter.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MemoError {
    #[error("Key not found: {0}")]
    NotFound(String),

    #[error("Remote fetch failed for key {key}: {message}")]
    Remote { key: String, message: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("Memoisation internal error: {0}")]
    Internal(String),
}

/// Wall-clock seconds since the Unix epoch, fractional.
pub(crate) fn unix_now_sec() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}
