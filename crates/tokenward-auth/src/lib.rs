//! # tokenward-auth
//!
//! Short-lived signed tokens whose validity is additionally gated by a session
//! record in a key-value store.
//!
//! A token can be checked for authenticity and expiry without any lookup, yet
//! it can still be revoked before it expires by deleting its session record.
//!
//! ## Modules
//!
//! - [`config`] - Secrets and lifetimes per token role
//! - [`claims`] - Typed claim sets for access and refresh tokens
//! - [`signer`] - Signing capability and the HS256 implementation
//! - [`store`] - Session store capability and the in-memory store
//! - [`issuer`] - Token pair issuance
//! - [`validator`] - Signature, expiry and session checks
//! - [`revoker`] - Session revocation
//! - [`middleware`] - Axum bearer authentication gate
//!
//! ## Flow
//!
//! ```ignore
//! let pair = issuer.issue(42).await?;
//! let claims = validator.validate(&pair.access_token, TokenRole::Access).await?;
//! let user_id = revoker.revoke(&claims).await?;
//! ```

pub mod claims;
pub mod config;
pub mod error;
pub mod issuer;
pub mod middleware;
pub mod revoker;
pub mod signer;
pub mod store;
pub mod validator;

pub use claims::{AccessClaims, ClaimSet, RefreshClaims, TokenRole};
pub use config::{ConfigError, TokenConfig, TokenSecret};
pub use error::{AuthError, ErrorCategory};
pub use issuer::{TokenIssuer, TokenPair};
pub use middleware::{AuthState, BearerAuth};
pub use revoker::TokenRevoker;
pub use signer::{HmacSigner, TokenSigner};
pub use store::{MemorySessionStore, SessionStore};
pub use validator::TokenValidator;

/// Type alias for authentication results.
pub type AuthResult<T> = Result<T, AuthError>;

/// Prelude module for convenient imports.
///
/// ```ignore
/// use tokenward_auth::prelude::*;
/// ```
pub mod prelude {
    pub use crate::AuthResult;
    pub use crate::claims::{AccessClaims, ClaimSet, RefreshClaims, TokenRole};
    pub use crate::config::{ConfigError, TokenConfig, TokenSecret};
    pub use crate::error::{AuthError, ErrorCategory};
    pub use crate::issuer::{TokenIssuer, TokenPair};
    pub use crate::middleware::{AuthState, BearerAuth};
    pub use crate::revoker::TokenRevoker;
    pub use crate::signer::{HmacSigner, TokenSigner};
    pub use crate::store::{MemorySessionStore, SessionStore};
    pub use crate::validator::TokenValidator;
}
