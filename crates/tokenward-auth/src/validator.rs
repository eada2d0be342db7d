//! Token validation.
//!
//! A token is valid only if its signature and expiry check out AND its session
//! record is still present in the store. The store lookup is what makes early
//! revocation possible, so it is never skipped.

use std::sync::Arc;

use crate::AuthResult;
use crate::claims::{ClaimSet, TokenRole};
use crate::error::AuthError;
use crate::signer::TokenSigner;
use crate::store::SessionStore;

/// Validates presented tokens against the signer and the session store.
pub struct TokenValidator {
    signer: Arc<dyn TokenSigner>,
    store: Arc<dyn SessionStore>,
}

impl TokenValidator {
    /// Creates a new validator.
    #[must_use]
    pub fn new(signer: Arc<dyn TokenSigner>, store: Arc<dyn SessionStore>) -> Self {
        Self { signer, store }
    }

    /// Validates `token` for `role` and returns its claims.
    ///
    /// # Errors
    ///
    /// - `MalformedCredential`, `BadSignature`, `Expired`, `MissingClaim` from
    ///   signature verification
    /// - `SessionNotFound` if the session was revoked or has expired in the store
    /// - `StoreUnavailable` if the store could not be consulted
    pub async fn validate(&self, token: &str, role: TokenRole) -> AuthResult<ClaimSet> {
        let claims = self.signer.verify(token, role).inspect_err(|e| {
            tracing::debug!(role = %role, reason = %e, "Token verification failed");
        })?;

        match self.store.get(claims.session_id()).await? {
            Some(_) => {
                tracing::debug!(
                    role = %role,
                    session_id = %claims.session_id(),
                    user_id = claims.user_id(),
                    "Token validated successfully"
                );
                Ok(claims)
            }
            None => {
                tracing::debug!(
                    role = %role,
                    session_id = %claims.session_id(),
                    "Session not found"
                );
                Err(AuthError::SessionNotFound)
            }
        }
    }
}
