//! The memoisation coordinator: tiered reads with request coalescing.
//!
//! Read path: in-memory map (TTL-checked on access), then the local store
//! (ignored when older than the configured max-age), then one remote fetch.
//! While a remote fetch for a key is in flight, further `wait = true` readers
//! queue as waiters on that key and are all resolved by the single fetch;
//! `wait = false` readers get an immediate not-found instead. A failed fetch
//! is delivered to every queued waiter as an error and the queue removed, so
//! waiters can never be left hanging.
//!
//! All cache and waiter state lives on this service object; the only mutator
//! is the coordinator itself.

use std::sync::Arc;
use std::time::Instant;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use regex::Regex;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::config::MemoConfig;

use super::store::{MemoStore, RemoteMemoSource};
use super::{unix_now_sec, CacheEntry, EntryMeta, MemoError};

type WaiterSender = oneshot::Sender<Result<CacheEntry, MemoError>>;

/// Waiters queued behind one in-flight fetch.
struct WaiterQueue {
    started_at_unix_sec: f64,
    waiting: Vec<WaiterSender>,
}

impl WaiterQueue {
    fn new() -> Self {
        Self {
            started_at_unix_sec: unix_now_sec(),
            waiting: Vec::new(),
        }
    }
}

/// Memory-tier entry with its expiry instant.
struct MemoisedEntry {
    entry: CacheEntry,
    expiry: Option<Instant>,
}

pub struct MemoCoordinator {
    memory: DashMap<String, MemoisedEntry>,
    store: Arc<dyn MemoStore>,
    remote: Arc<dyn RemoteMemoSource>,
    in_flight: DashMap<String, WaiterQueue>,
    config: MemoConfig,
}

impl MemoCoordinator {
    pub fn new(
        store: Arc<dyn MemoStore>,
        remote: Arc<dyn RemoteMemoSource>,
        config: MemoConfig,
    ) -> Self {
        Self {
            memory: DashMap::new(),
            store,
            remote,
            in_flight: DashMap::new(),
            config,
        }
    }

    fn calculate_expiry(&self) -> Option<Instant> {
        if self.config.memory_ttl.as_millis() > 0 {
            Some(Instant::now() + self.config.memory_ttl)
        } else {
            None
        }
    }

    fn local_entry_is_fresh(&self, entry: &CacheEntry) -> bool {
        let age = unix_now_sec() - entry.memoised_at_unix_sec;
        age <= self.config.local_max_age.as_secs_f64()
    }

    fn memory_get(&self, key: &str) -> Option<CacheEntry> {
        let now = Instant::now();
        self.memory.remove_if(key, |_, value| {
            value.expiry.map(|expiry| now >= expiry).unwrap_or(false)
        });

        self.memory.get_mut(key).map(|mut value| {
            value.entry.last_read_at_unix_sec = Some(unix_now_sec());
            value.entry.clone()
        })
    }

    fn memory_insert(&self, entry: CacheEntry) {
        self.memory.insert(
            entry.key.clone(),
            MemoisedEntry {
                entry,
                expiry: self.calculate_expiry(),
            },
        );
    }

    /// Reads a memoised entry, coalescing concurrent fetches per key.
    ///
    /// With `wait = true`, a read that finds a fetch already in flight queues
    /// behind it and resolves when that fetch does. With `wait = false`, the
    /// caller gets [`MemoError::NotFound`] rather than waiting.
    #[tracing::instrument(level = "debug", skip(self))]
    pub async fn get_memoised(&self, key: &str, wait: bool) -> Result<CacheEntry, MemoError> {
        if let Some(entry) = self.memory_get(key) {
            return Ok(entry);
        }

        match self.store.load_entry(key).await {
            Ok(Some(entry)) if self.local_entry_is_fresh(&entry) => {
                self.memory_insert(entry.clone());
                return Ok(entry);
            }
            Ok(_) => {}
            Err(e) => {
                // A broken local tier falls through to the remote
                warn!(key, error = %e, "local memo store read failed");
            }
        }

        // Join an in-flight fetch, or become the leader for this key. The
        // entry guard is dropped before any await point.
        let receiver = match self.in_flight.entry(key.to_string()) {
            Entry::Occupied(mut occupied) => {
                if !wait {
                    return Err(MemoError::NotFound(key.to_string()));
                }
                let (tx, rx) = oneshot::channel();
                occupied.get_mut().waiting.push(tx);
                Some(rx)
            }
            Entry::Vacant(vacant) => {
                vacant.insert(WaiterQueue::new());
                None
            }
        };

        if let Some(rx) = receiver {
            debug!(key, "queued behind in-flight fetch");
            return rx
                .await
                .map_err(|_| MemoError::Internal(format!("fetch abandoned for key {}", key)))?;
        }

        let result = self.lead_fetch(key).await;

        // Deliver the outcome, success or failure, to every queued waiter
        if let Some((_, queue)) = self.in_flight.remove(key) {
            debug!(
                key,
                waiters = queue.waiting.len(),
                elapsed_sec = unix_now_sec() - queue.started_at_unix_sec,
                "fetch settled"
            );
            for tx in queue.waiting {
                let _ = tx.send(result.clone());
            }
        }

        result
    }

    async fn lead_fetch(&self, key: &str) -> Result<CacheEntry, MemoError> {
        debug!(key, "fetching from remote");
        let fetched = self.remote.fetch(key).await?;
        let entry = fetched.ok_or_else(|| MemoError::NotFound(key.to_string()))?;

        self.memory_insert(entry.clone());
        if let Err(e) = self.store.store_entry(&entry).await {
            // Local persistence is an optimisation; the read still succeeded
            warn!(key, error = %e, "failed to persist fetched memo entry");
        }
        Ok(entry)
    }

    /// Memoises a freshly computed payload across all three tiers.
    #[tracing::instrument(level = "debug", skip(self, payload))]
    pub async fn memoise(
        &self,
        key: &str,
        payload: Vec<u8>,
        meta: EntryMeta,
    ) -> Result<(), MemoError> {
        let entry = CacheEntry {
            key: key.to_string(),
            payload,
            memoised_at_unix_sec: unix_now_sec(),
            last_read_at_unix_sec: None,
            scan_id: meta.scan_id,
            quant_id: meta.quant_id,
            expr_id: meta.expr_id,
        };

        self.memory_insert(entry.clone());
        self.store.store_entry(&entry).await?;
        self.remote.publish(&entry).await
    }

    /// Evicts one key from every tier.
    pub async fn delete(&self, key: &str) -> Result<(), MemoError> {
        self.memory.remove(key);
        self.store.delete_entry(key).await?;
        self.remote.delete(key).await
    }

    /// Evicts every key matching `pattern` (a regex) from every tier.
    ///
    /// Returns how many keys were dropped from the local tiers.
    pub async fn delete_matching(&self, pattern: &str) -> Result<usize, MemoError> {
        let regex =
            Regex::new(pattern).map_err(|e| MemoError::InvalidPattern(e.to_string()))?;

        let before = self.memory.len();
        self.memory.retain(|key, _| !regex.is_match(key));
        let mut dropped = before - self.memory.len();

        for key in self.store.list_keys().await? {
            if regex.is_match(&key) {
                self.store.delete_entry(&key).await?;
                dropped += 1;
            }
        }

        self.remote.delete_matching(pattern).await?;
        Ok(dropped)
    }
}
