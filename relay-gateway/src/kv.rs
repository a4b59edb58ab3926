//! Key-value seam for the cache and job queue.
//!
//! Mirrors the pluggable-storage pattern used at the session-store seam: a
//! small trait with TTL get/set/delete plus list primitives, and an
//! in-memory implementation that is the default backend.

use async_trait::async_trait;
use relay_core::Error;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::time::Duration;
use std::time::Instant;
use tokio::sync::Mutex;

#[async_trait]
pub trait KvStore: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, Error>;

    /// Set a value; `ttl = None` means no expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), Error>;

    async fn delete(&self, key: &str) -> Result<(), Error>;

    /// Push to the head of a list, returning the new length.
    async fn lpush(&self, key: &str, value: String) -> Result<u64, Error>;

    /// Pop from the tail of a list (FIFO when paired with `lpush`).
    async fn rpop(&self, key: &str) -> Result<Option<String>, Error>;

    /// Trim a list to at most `max_len` elements, dropping the oldest.
    async fn ltrim(&self, key: &str, max_len: u64) -> Result<(), Error>;
}

#[derive(Debug)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

#[derive(Debug, Default)]
struct Inner {
    entries: HashMap<String, Entry>,
    lists: HashMap<String, VecDeque<String>>,
}

/// In-process KV store with TTL and list support.
#[derive(Debug, Default)]
pub struct InMemoryKv {
    inner: Mutex<Inner>,
}

impl InMemoryKv {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for InMemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, Error> {
        let mut inner = self.inner.lock().await;
        let expired = match inner.entries.get(key) {
            Some(entry) => entry.expires_at.is_some_and(|at| Instant::now() >= at),
            None => return Ok(None),
        };
        if expired {
            inner.entries.remove(key);
            return Ok(None);
        }
        Ok(inner.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        inner.entries.insert(
            key.to_string(),
            Entry {
                value,
                expires_at: ttl.map(|ttl| Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        inner.entries.remove(key);
        Ok(())
    }

    async fn lpush(&self, key: &str, value: String) -> Result<u64, Error> {
        let mut inner = self.inner.lock().await;
        let list = inner.lists.entry(key.to_string()).or_default();
        list.push_front(value);
        Ok(list.len() as u64)
    }

    async fn rpop(&self, key: &str) -> Result<Option<String>, Error> {
        let mut inner = self.inner.lock().await;
        Ok(inner.lists.get_mut(key).and_then(VecDeque::pop_back))
    }

    async fn ltrim(&self, key: &str, max_len: u64) -> Result<(), Error> {
        let mut inner = self.inner.lock().await;
        if let Some(list) = inner.lists.get_mut(key) {
            while list.len() as u64 > max_len {
                list.pop_back();
            }
        }
        Ok(())
    }
}
