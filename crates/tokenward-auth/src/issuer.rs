//! Token pair issuance.
//!
//! Issuing a session signs one access and one refresh token and records both
//! session identifiers in the [`SessionStore`]. Both tokens are signed before
//! anything is written, so a signing failure never leaves a record behind.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use time::OffsetDateTime;

use crate::AuthResult;
use crate::claims::{ClaimSet, TokenRole};
use crate::config::TokenConfig;
use crate::error::AuthError;
use crate::signer::TokenSigner;
use crate::store::SessionStore;

/// An access token and a refresh token issued together.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TokenPair {
    /// Principal the tokens were issued for.
    pub user_id: u64,

    /// Signed access token.
    pub access_token: String,
    /// Access session identifier.
    pub access_uuid: String,
    /// Access token expiry (Unix timestamp).
    pub access_expires: i64,

    /// Signed refresh token.
    pub refresh_token: String,
    /// Refresh session identifier.
    pub refresh_uuid: String,
    /// Refresh token expiry (Unix timestamp).
    pub refresh_expires: i64,
}

/// Issues token pairs and records their sessions.
pub struct TokenIssuer {
    signer: Arc<dyn TokenSigner>,
    store: Arc<dyn SessionStore>,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenIssuer {
    /// Creates a new issuer.
    ///
    /// Only the lifetimes are taken from `config`; secrets live in the signer.
    #[must_use]
    pub fn new(
        signer: Arc<dyn TokenSigner>,
        store: Arc<dyn SessionStore>,
        config: &TokenConfig,
    ) -> Self {
        Self {
            signer,
            store,
            access_lifetime: config.access_lifetime,
            refresh_lifetime: config.refresh_lifetime,
        }
    }

    /// Issues an access/refresh token pair for `user_id`.
    ///
    /// # Errors
    ///
    /// - `AuthError::SigningFailure` if either token cannot be signed; nothing
    ///   is written to the store in that case.
    /// - `AuthError::StoreUnavailable` if a session record cannot be written.
    ///   The tokens must not be handed out.
    pub async fn issue(&self, user_id: u64) -> AuthResult<TokenPair> {
        let now = OffsetDateTime::now_utc();
        let access = ClaimSet::new_session(
            TokenRole::Access,
            user_id,
            expiry_after(now, self.access_lifetime),
        );
        let refresh = ClaimSet::new_session(
            TokenRole::Refresh,
            user_id,
            expiry_after(now, self.refresh_lifetime),
        );

        let access_token = self.signer.sign(&access)?;
        let refresh_token = self.signer.sign(&refresh)?;

        self.persist(&access).await?;
        if let Err(e) = self.persist(&refresh).await {
            // Do not leave a usable access session for a pair nobody received.
            if let Err(cleanup) = self.store.delete(access.session_id()).await {
                tracing::warn!(
                    access_uuid = %access.session_id(),
                    error = %cleanup,
                    "Failed to remove access session after refresh write failed"
                );
            }
            return Err(e);
        }

        tracing::debug!(
            user_id,
            access_uuid = %access.session_id(),
            refresh_uuid = %refresh.session_id(),
            "Issued token pair"
        );

        Ok(TokenPair {
            user_id,
            access_token,
            access_uuid: access.session_id().to_string(),
            access_expires: access.expires_at(),
            refresh_token,
            refresh_uuid: refresh.session_id().to_string(),
            refresh_expires: refresh.expires_at(),
        })
    }

    /// Writes the session record for `claims`.
    ///
    /// The record's lifetime is measured from the current instant to the
    /// signed expiry, so it can never outlive the token.
    async fn persist(&self, claims: &ClaimSet) -> AuthResult<()> {
        let ttl = remaining_lifetime(claims.expires_at(), OffsetDateTime::now_utc())
            .ok_or_else(|| AuthError::internal("session lifetime must be positive"))?;

        self.store
            .set(claims.session_id(), &claims.user_id().to_string(), ttl)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    role = %claims.role(),
                    session_id = %claims.session_id(),
                    error = %e,
                    "Failed to persist session record"
                );
            })
    }
}

/// Whole-second expiry `lifetime` after `now`.
fn expiry_after(now: OffsetDateTime, lifetime: Duration) -> i64 {
    let secs = i64::try_from(lifetime.as_secs()).unwrap_or(i64::MAX);
    now.unix_timestamp().saturating_add(secs)
}

/// Time from `now` until the `exp` second begins, or `None` if already passed.
fn remaining_lifetime(exp: i64, now: OffsetDateTime) -> Option<Duration> {
    let expires = OffsetDateTime::from_unix_timestamp(exp).ok()?;
    let remaining = expires - now;
    if remaining.is_positive() {
        Duration::try_from(remaining).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::signer::HmacSigner;
    use crate::store::MemorySessionStore;

    fn config() -> TokenConfig {
        TokenConfig::with_secrets("access-secret", "refresh-secret")
            .with_access_lifetime(Duration::from_secs(900))
            .with_refresh_lifetime(Duration::from_secs(86_400))
    }

    fn issuer_with(store: Arc<dyn SessionStore>) -> TokenIssuer {
        let config = config();
        TokenIssuer::new(Arc::new(HmacSigner::from_config(&config)), store, &config)
    }

    /// Store that accepts the first `allowed` writes and fails afterwards.
    struct FlakyStore {
        inner: MemorySessionStore,
        allowed: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for FlakyStore {
        async fn set(&self, key: &str, value: &str, ttl: Duration) -> AuthResult<()> {
            use std::sync::atomic::Ordering;
            if self
                .allowed
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
            {
                return Err(AuthError::store_unavailable("connection reset"));
            }
            self.inner.set(key, value, ttl).await
        }

        async fn get(&self, key: &str) -> AuthResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn delete(&self, key: &str) -> AuthResult<Option<String>> {
            self.inner.delete(key).await
        }
    }

    struct FailingSigner;

    impl TokenSigner for FailingSigner {
        fn sign(&self, _claims: &ClaimSet) -> AuthResult<String> {
            Err(AuthError::signing_failure("no key"))
        }

        fn verify(&self, _token: &str, _role: TokenRole) -> AuthResult<ClaimSet> {
            Err(AuthError::BadSignature)
        }
    }

    #[tokio::test]
    async fn test_issue_writes_both_records() {
        let store = Arc::new(MemorySessionStore::new());
        let pair = issuer_with(store.clone()).issue(42).await.unwrap();

        assert_eq!(pair.user_id, 42);
        assert_ne!(pair.access_uuid, pair.refresh_uuid);
        assert_eq!(
            store.get(&pair.access_uuid).await.unwrap().as_deref(),
            Some("42")
        );
        assert_eq!(
            store.get(&pair.refresh_uuid).await.unwrap().as_deref(),
            Some("42")
        );
    }

    #[tokio::test]
    async fn test_record_ttl_never_exceeds_expiry() {
        let store = Arc::new(MemorySessionStore::new());
        let pair = issuer_with(store.clone()).issue(1).await.unwrap();
        let now = OffsetDateTime::now_utc().unix_timestamp();

        let access_ttl = store.remaining_ttl(&pair.access_uuid).unwrap();
        let refresh_ttl = store.remaining_ttl(&pair.refresh_uuid).unwrap();
        assert!(access_ttl > Duration::ZERO);
        assert!(access_ttl.as_secs() as i64 <= pair.access_expires - now);
        assert!(refresh_ttl.as_secs() as i64 <= pair.refresh_expires - now);
        assert!(refresh_ttl > access_ttl);
    }

    #[tokio::test]
    async fn test_zero_lifetime_is_internal_error() {
        let store = Arc::new(MemorySessionStore::new());
        let config = config().with_access_lifetime(Duration::ZERO);
        let issuer = TokenIssuer::new(
            Arc::new(HmacSigner::from_config(&config)),
            store.clone(),
            &config,
        );

        let err = issuer.issue(1).await.unwrap_err();
        assert!(matches!(err, AuthError::Internal { .. }), "got {err:?}");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_signing_failure_writes_nothing() {
        let store = Arc::new(MemorySessionStore::new());
        let issuer = TokenIssuer::new(Arc::new(FailingSigner), store.clone(), &config());

        let err = issuer.issue(1).await.unwrap_err();
        assert!(matches!(err, AuthError::SigningFailure { .. }));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_access_write_failure_is_store_error() {
        let store = Arc::new(FlakyStore {
            inner: MemorySessionStore::new(),
            allowed: 0.into(),
        });
        let err = issuer_with(store.clone()).issue(1).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable { .. }));
        assert!(store.inner.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_write_failure_removes_access_record() {
        let store = Arc::new(FlakyStore {
            inner: MemorySessionStore::new(),
            allowed: 1.into(),
        });
        let err = issuer_with(store.clone()).issue(1).await.unwrap_err();
        assert!(matches!(err, AuthError::StoreUnavailable { .. }));
        assert!(store.inner.is_empty());
    }

    #[test]
    fn test_remaining_lifetime() {
        let now = OffsetDateTime::now_utc();
        let exp = now.unix_timestamp() + 10;
        let remaining = remaining_lifetime(exp, now).unwrap();
        assert!(remaining <= Duration::from_secs(10));
        assert!(remaining > Duration::from_secs(8));

        assert!(remaining_lifetime(now.unix_timestamp() - 1, now).is_none());
    }
}
