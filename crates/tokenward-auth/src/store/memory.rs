//! In-memory session store backed by `DashMap`.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;

use super::SessionStore;
use crate::AuthResult;

#[derive(Clone, Debug)]
struct SessionEntry {
    value: String,
    expires_at: Instant,
}

impl SessionEntry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Session store kept in process memory.
///
/// Expired entries are dropped lazily when touched, or in bulk by
/// [`purge_expired`](Self::purge_expired). Records do not survive a restart
/// and are not shared between instances.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: DashMap<String, SessionEntry>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the time left before `key` expires, if it is present.
    #[must_use]
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        self.entries
            .get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.expires_at.saturating_duration_since(Instant::now()))
    }

    /// Returns `true` if a live record exists for `key`.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.remaining_ttl(key).is_some()
    }

    /// Number of entries, including expired ones not yet purged.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every expired entry and returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(removed, "Purged expired sessions");
        }
        removed
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
        self.entries.insert(
            key.to_string(),
            SessionEntry {
                value: value.to_string(),
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> AuthResult<Option<String>> {
        // remove_if keeps the expiry check and eviction under one shard lock
        if self
            .entries
            .remove_if(key, |_, entry| entry.is_expired())
            .is_some()
        {
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn delete(&self, key: &str) -> AuthResult<Option<String>> {
        Ok(self
            .entries
            .remove(key)
            .filter(|(_, entry)| !entry.is_expired())
            .map(|(_, entry)| entry.value))
    }
}
