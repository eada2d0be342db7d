//! Claim sets carried inside signed tokens.
//!
//! A token asserts exactly one role. Access tokens carry an `access_uuid`
//! session identifier, refresh tokens a `refresh_uuid`; the two never appear
//! together. Both carry the principal (`user_id`) and an absolute expiry
//! (`exp`, Unix seconds).
//!
//! Verified payloads arrive as untyped JSON maps and are converted once, via
//! [`ClaimSet::from_map`], into the typed form used everywhere else.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::AuthResult;
use crate::error::AuthError;

/// Name of the principal claim.
pub const USER_ID_CLAIM: &str = "user_id";

/// Name of the expiry claim.
pub const EXPIRY_CLAIM: &str = "exp";

/// Role a token plays in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenRole {
    /// Short-lived token presented on every request.
    Access,
    /// Long-lived token used to obtain new access tokens.
    Refresh,
}

impl TokenRole {
    /// Returns the role name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }

    /// Returns the claim that holds this role's session identifier.
    #[must_use]
    pub fn session_claim(&self) -> &'static str {
        match self {
            Self::Access => "access_uuid",
            Self::Refresh => "refresh_uuid",
        }
    }
}

impl fmt::Display for TokenRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TokenRole {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access" => Ok(Self::Access),
            "refresh" => Ok(Self::Refresh),
            other => Err(AuthError::malformed_credential(format!(
                "unknown token role '{other}'"
            ))),
        }
    }
}

/// Claims of an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    /// Session identifier, also the session store key.
    pub access_uuid: String,

    /// Authenticated principal.
    pub user_id: u64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Claims of a refresh token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RefreshClaims {
    /// Session identifier, also the session store key.
    pub refresh_uuid: String,

    /// Authenticated principal.
    pub user_id: u64,

    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// The payload of exactly one token.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ClaimSet {
    /// Access token claims.
    Access(AccessClaims),
    /// Refresh token claims.
    Refresh(RefreshClaims),
}

impl ClaimSet {
    /// Builds claims for a fresh session of the given role.
    ///
    /// A new UUID v4 session identifier is generated for every call.
    #[must_use]
    pub fn new_session(role: TokenRole, user_id: u64, exp: i64) -> Self {
        let session_id = uuid::Uuid::new_v4().to_string();
        match role {
            TokenRole::Access => Self::Access(AccessClaims {
                access_uuid: session_id,
                user_id,
                exp,
            }),
            TokenRole::Refresh => Self::Refresh(RefreshClaims {
                refresh_uuid: session_id,
                user_id,
                exp,
            }),
        }
    }

    /// Converts a verified, untyped payload into typed claims.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingClaim` naming the first claim that is absent
    /// or has the wrong JSON type.
    pub fn from_map(role: TokenRole, claims: &Map<String, Value>) -> AuthResult<Self> {
        let session_claim = role.session_claim();
        let session_id = claims
            .get(session_claim)
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AuthError::missing_claim(session_claim))?
            .to_string();
        let user_id = claims
            .get(USER_ID_CLAIM)
            .and_then(Value::as_u64)
            .ok_or_else(|| AuthError::missing_claim(USER_ID_CLAIM))?;
        let exp = claims
            .get(EXPIRY_CLAIM)
            .and_then(Value::as_i64)
            .ok_or_else(|| AuthError::missing_claim(EXPIRY_CLAIM))?;

        Ok(match role {
            TokenRole::Access => Self::Access(AccessClaims {
                access_uuid: session_id,
                user_id,
                exp,
            }),
            TokenRole::Refresh => Self::Refresh(RefreshClaims {
                refresh_uuid: session_id,
                user_id,
                exp,
            }),
        })
    }

    /// Returns the role these claims belong to.
    #[must_use]
    pub fn role(&self) -> TokenRole {
        match self {
            Self::Access(_) => TokenRole::Access,
            Self::Refresh(_) => TokenRole::Refresh,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub fn session_id(&self) -> &str {
        match self {
            Self::Access(claims) => &claims.access_uuid,
            Self::Refresh(claims) => &claims.refresh_uuid,
        }
    }

    /// Returns the principal.
    #[must_use]
    pub fn user_id(&self) -> u64 {
        match self {
            Self::Access(claims) => claims.user_id,
            Self::Refresh(claims) => claims.user_id,
        }
    }

    /// Returns the expiry as a Unix timestamp.
    #[must_use]
    pub fn expires_at(&self) -> i64 {
        match self {
            Self::Access(claims) => claims.exp,
            Self::Refresh(claims) => claims.exp,
        }
    }

    /// Returns the access claims, if these are access claims.
    #[must_use]
    pub fn as_access(&self) -> Option<&AccessClaims> {
        match self {
            Self::Access(claims) => Some(claims),
            Self::Refresh(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_session_claim_names() {
        assert_eq!(TokenRole::Access.session_claim(), "access_uuid");
        assert_eq!(TokenRole::Refresh.session_claim(), "refresh_uuid");
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("access".parse::<TokenRole>().unwrap(), TokenRole::Access);
        assert_eq!("refresh".parse::<TokenRole>().unwrap(), TokenRole::Refresh);
        assert!(matches!(
            "id".parse::<TokenRole>(),
            Err(AuthError::MalformedCredential { .. })
        ));
    }

    #[test]
    fn test_access_claims_wire_form() {
        let claims = ClaimSet::Access(AccessClaims {
            access_uuid: "abc".to_string(),
            user_id: 42,
            exp: 1_700_000_000,
        });
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(
            value,
            json!({"access_uuid": "abc", "user_id": 42, "exp": 1_700_000_000})
        );
    }

    #[test]
    fn test_refresh_claims_wire_form() {
        let claims = ClaimSet::new_session(TokenRole::Refresh, 7, 1_700_000_000);
        let value = serde_json::to_value(&claims).unwrap();
        let map = value.as_object().unwrap();
        assert!(map.contains_key("refresh_uuid"));
        assert!(!map.contains_key("access_uuid"));
        assert_eq!(map["user_id"], json!(7));
    }

    #[test]
    fn test_new_session_ids_are_unique() {
        let a = ClaimSet::new_session(TokenRole::Access, 1, 0);
        let b = ClaimSet::new_session(TokenRole::Access, 1, 0);
        assert_ne!(a.session_id(), b.session_id());
        assert!(uuid::Uuid::parse_str(a.session_id()).is_ok());
    }

    #[test]
    fn test_from_map_access() {
        let map = as_map(json!({"access_uuid": "s-1", "user_id": 42, "exp": 100}));
        let claims = ClaimSet::from_map(TokenRole::Access, &map).unwrap();
        assert_eq!(claims.role(), TokenRole::Access);
        assert_eq!(claims.session_id(), "s-1");
        assert_eq!(claims.user_id(), 42);
        assert_eq!(claims.expires_at(), 100);
    }

    #[test]
    fn test_from_map_wrong_role_is_missing_claim() {
        let map = as_map(json!({"refresh_uuid": "s-1", "user_id": 42, "exp": 100}));
        let err = ClaimSet::from_map(TokenRole::Access, &map).unwrap_err();
        assert!(matches!(err, AuthError::MissingClaim { ref claim } if claim == "access_uuid"));
    }

    #[test]
    fn test_from_map_wrong_type_is_missing_claim() {
        let map = as_map(json!({"access_uuid": 12, "user_id": 42, "exp": 100}));
        let err = ClaimSet::from_map(TokenRole::Access, &map).unwrap_err();
        assert!(matches!(err, AuthError::MissingClaim { ref claim } if claim == "access_uuid"));

        let map = as_map(json!({"access_uuid": "s", "user_id": "42", "exp": 100}));
        let err = ClaimSet::from_map(TokenRole::Access, &map).unwrap_err();
        assert!(matches!(err, AuthError::MissingClaim { ref claim } if claim == "user_id"));
    }

    #[test]
    fn test_as_access() {
        let access = ClaimSet::new_session(TokenRole::Access, 1, 0);
        assert!(access.as_access().is_some());
        let refresh = ClaimSet::new_session(TokenRole::Refresh, 1, 0);
        assert!(refresh.as_access().is_none());
    }
}
