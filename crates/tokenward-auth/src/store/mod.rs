//! Session store capability.
//!
//! A session record maps a session identifier to the principal that owns it
//! and expires on its own once its time-to-live elapses. The issuer writes
//! records, the validator reads them and the revoker deletes them.
//!
//! # Implementations
//!
//! - [`MemorySessionStore`] - in-process store for tests and single-instance deployments
//! - `tokenward-redis` - Redis-backed store shared by all instances

pub mod memory;

use std::time::Duration;

use async_trait::async_trait;

use crate::AuthResult;

pub use memory::MemorySessionStore;

/// Keyed time-to-live store for session records.
///
/// Implementations must make `get` and `delete` atomic per key so that a
/// validation racing a revocation observes either the record or its absence.
/// Transport failures and timeouts are reported as
/// `AuthError::StoreUnavailable` and are never retried here.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// The record disappears by itself after `ttl`.
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()>;

    /// Returns the value stored under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> AuthResult<Option<String>>;

    /// Removes `key` and returns the value it held.
    ///
    /// Returns `None` if there was nothing to remove.
    async fn delete(&self, key: &str) -> AuthResult<Option<String>>;
}
