//! Token signing and verification.
//!
//! [`TokenSigner`] is the capability the issuer and validator depend on.
//! [`HmacSigner`] implements it with HS256 JWTs and one secret per role.
//!
//! ## Verification order
//!
//! 1. The header segment is decoded; anything unreadable is a malformed credential.
//! 2. The header `alg` must be exactly `HS256`. Every other value, `none`
//!    included, is rejected before any key is touched.
//! 3. The MAC is checked with the role's secret.
//! 4. `exp` must be present and strictly in the future.
//! 5. The payload is converted into a typed [`ClaimSet`].

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::AuthResult;
use crate::claims::{ClaimSet, EXPIRY_CLAIM, TokenRole};
use crate::config::TokenConfig;
use crate::error::AuthError;

/// The only accepted signing algorithm.
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Produces and checks signed tokens.
pub trait TokenSigner: Send + Sync {
    /// Signs a claim set with the secret of its role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::SigningFailure` if the claims cannot be encoded.
    fn sign(&self, claims: &ClaimSet) -> AuthResult<String>;

    /// Verifies a token for the given role and returns its claims.
    ///
    /// Does not consult any session store.
    ///
    /// # Errors
    ///
    /// Returns `MalformedCredential`, `BadSignature`, `Expired` or
    /// `MissingClaim` depending on which check failed.
    fn verify(&self, token: &str, role: TokenRole) -> AuthResult<ClaimSet>;
}

struct RoleKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl RoleKeys {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// HS256 signer with independent access and refresh secrets.
pub struct HmacSigner {
    access: RoleKeys,
    refresh: RoleKeys,
    validation: Validation,
}

impl HmacSigner {
    /// Creates a signer from raw secrets.
    #[must_use]
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&[EXPIRY_CLAIM]);

        Self {
            access: RoleKeys::from_secret(access_secret),
            refresh: RoleKeys::from_secret(refresh_secret),
            validation,
        }
    }

    /// Creates a signer from token configuration.
    #[must_use]
    pub fn from_config(config: &TokenConfig) -> Self {
        Self::new(
            config.access_secret.as_bytes(),
            config.refresh_secret.as_bytes(),
        )
    }

    fn keys(&self, role: TokenRole) -> &RoleKeys {
        match role {
            TokenRole::Access => &self.access,
            TokenRole::Refresh => &self.refresh,
        }
    }
}

impl TokenSigner for HmacSigner {
    fn sign(&self, claims: &ClaimSet) -> AuthResult<String> {
        let header = Header::new(SIGNING_ALGORITHM);
        encode(&header, claims, &self.keys(claims.role()).encoding)
            .map_err(|e| AuthError::signing_failure(e.to_string()))
    }

    fn verify(&self, token: &str, role: TokenRole) -> AuthResult<ClaimSet> {
        let segments = split_token(token)?;
        if segments.alg != "HS256" {
            tracing::debug!(alg = %segments.alg, "Rejected token with disallowed algorithm");
            return Err(AuthError::BadSignature);
        }

        // A signature that is not canonical base64url cannot match any MAC.
        if URL_SAFE_NO_PAD.decode(segments.signature).is_err() {
            return Err(AuthError::BadSignature);
        }

        let data = decode::<Map<String, Value>>(token, &self.keys(role).decoding, &self.validation)
            .map_err(map_jwt_error)?;

        let claims = ClaimSet::from_map(role, &data.claims)?;

        // Library check allows exp == now.
        if claims.expires_at() <= OffsetDateTime::now_utc().unix_timestamp() {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

struct TokenSegments<'a> {
    alg: String,
    signature: &'a str,
}

/// Splits a compact JWT and reads the header `alg` without verifying anything.
///
/// Everything after the second `.` is the signature segment, so a stray dot
/// in the signature is a signature problem rather than a framing one.
fn split_token(token: &str) -> AuthResult<TokenSegments<'_>> {
    let mut segments = token.splitn(3, '.');
    let (Some(header), Some(_), Some(signature)) =
        (segments.next(), segments.next(), segments.next())
    else {
        return Err(AuthError::malformed_credential(
            "token must have three segments",
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| AuthError::malformed_credential(format!("token header: {e}")))?;
    let header: Value = serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::malformed_credential(format!("token header: {e}")))?;

    let alg = header
        .get("alg")
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or(AuthError::BadSignature)?;

    Ok(TokenSegments { alg, signature })
}

fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    use jsonwebtoken::errors::ErrorKind;

    match err.kind() {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => AuthError::BadSignature,
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::MissingRequiredClaim(claim) | ErrorKind::InvalidClaimFormat(claim) => {
            AuthError::missing_claim(claim.clone())
        }
        _ => AuthError::malformed_credential(err.to_string()),
    }
}
