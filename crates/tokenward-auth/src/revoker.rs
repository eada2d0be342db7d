//! Session revocation.
//!
//! Revoking deletes a session record. The token stays cryptographically valid
//! until it expires, but the validator will no longer find its session.

use std::sync::Arc;

use crate::AuthResult;
use crate::claims::{ClaimSet, TokenRole};
use crate::error::AuthError;
use crate::store::SessionStore;

/// Deletes session records.
pub struct TokenRevoker {
    store: Arc<dyn SessionStore>,
}

impl TokenRevoker {
    /// Creates a new revoker.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Revokes the access session named by `claims` and returns its principal.
    ///
    /// Only access claims are accepted. The refresh session issued alongside
    /// stays valid and must be revoked separately with
    /// [`revoke_session`](Self::revoke_session).
    ///
    /// # Errors
    ///
    /// - `MissingClaim` if `claims` are not access claims
    /// - `SessionNotFound` if the session was already revoked or expired
    /// - `StoreUnavailable` if the store could not be reached
    pub async fn revoke(&self, claims: &ClaimSet) -> AuthResult<u64> {
        let access = claims
            .as_access()
            .ok_or_else(|| AuthError::missing_claim(TokenRole::Access.session_claim()))?;
        self.revoke_session(&access.access_uuid).await
    }

    /// Revokes any session by identifier and returns its principal.
    ///
    /// # Errors
    ///
    /// - `SessionNotFound` if no record exists for `session_id`
    /// - `StoreUnavailable` if the store could not be reached
    /// - `Internal` if the stored principal is not a decimal user id
    pub async fn revoke_session(&self, session_id: &str) -> AuthResult<u64> {
        let Some(stored) = self.store.delete(session_id).await? else {
            tracing::debug!(session_id = %session_id, "Revocation of unknown session");
            return Err(AuthError::SessionNotFound);
        };

        let user_id = stored.parse::<u64>().map_err(|_| {
            AuthError::internal(format!("session {session_id} holds a malformed principal"))
        })?;

        tracing::info!(session_id = %session_id, user_id, "Session revoked");
        Ok(user_id)
    }
}
