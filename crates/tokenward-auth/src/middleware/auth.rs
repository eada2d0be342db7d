//! Bearer token authentication extractor.

use std::sync::{Arc, LazyLock};

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use regex::Regex;

use crate::AuthResult;
use crate::claims::{ClaimSet, TokenRole};
use crate::error::AuthError;
use crate::validator::TokenValidator;

/// Whole-header match: the literal scheme, one space, then the credential.
static BEARER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Bearer (\S+)$").expect("Invalid bearer regex"));

// =============================================================================
// Auth State
// =============================================================================

/// State required for bearer token authentication.
///
/// Include it in your application state and expose it to [`BearerAuth`]
/// through `FromRef`.
///
/// ```ignore
/// #[derive(Clone)]
/// struct AppState {
///     auth: AuthState,
/// }
///
/// impl FromRef<AppState> for AuthState {
///     fn from_ref(state: &AppState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthState {
    /// Validator for presented access tokens.
    pub validator: Arc<TokenValidator>,
}

impl AuthState {
    /// Creates a new auth state.
    #[must_use]
    pub fn new(validator: Arc<TokenValidator>) -> Self {
        Self { validator }
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Extracts the signed token from an `Authorization` header value.
///
/// The header must be exactly `Bearer <base64>` where the credential is the
/// token encoded with the standard base64 alphabet.
///
/// # Errors
///
/// Returns `AuthError::MalformedCredential` if the header does not match or
/// the credential does not decode to UTF-8 text.
pub fn parse_bearer(header: &str) -> AuthResult<String> {
    let encoded = BEARER_PATTERN
        .captures(header)
        .and_then(|caps| caps.get(1))
        .ok_or_else(|| AuthError::malformed_credential("expected 'Bearer <credential>'"))?
        .as_str();

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| AuthError::malformed_credential(format!("credential is not base64: {e}")))?;

    String::from_utf8(bytes)
        .map_err(|_| AuthError::malformed_credential("credential is not UTF-8"))
}

/// Authenticates a request from its headers.
///
/// Runs header extraction, decoding and access token validation.
///
/// # Errors
///
/// Any error from [`parse_bearer`] or [`TokenValidator::validate`].
pub async fn authenticate(state: &AuthState, headers: &HeaderMap) -> AuthResult<ClaimSet> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::malformed_credential("missing Authorization header"))?
        .to_str()
        .map_err(|_| AuthError::malformed_credential("Authorization header is not ASCII"))?;

    let token = parse_bearer(header)?;
    state.validator.validate(&token, TokenRole::Access).await
}

// =============================================================================
// Bearer Auth Extractor
// =============================================================================

/// Axum extractor that validates the bearer access token.
///
/// On success the handler receives the validated claims directly.
///
/// # Errors
///
/// Rejects with `AuthError`, whose response collapses every credential
/// problem into the same `401` and reports store outages as `503`.
///
/// ```ignore
/// async fn handler(BearerAuth(claims): BearerAuth) -> impl IntoResponse {
///     format!("user {}", claims.user_id())
/// }
/// ```
pub struct BearerAuth(pub ClaimSet);

impl<S> FromRequestParts<S> for BearerAuth
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_state = AuthState::from_ref(state);

        match authenticate(&auth_state, &parts.headers).await {
            Ok(claims) => Ok(BearerAuth(claims)),
            Err(e) => {
                tracing::debug!(
                    category = %e.category(),
                    reason = %e,
                    path = %parts.uri.path(),
                    "Request authentication failed"
                );
                Err(e)
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
