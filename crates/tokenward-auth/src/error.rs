//! Authentication error types.
//!
//! Every failure the issuer, validator, revoker or bearer gate can produce is
//! an [`AuthError`]. The first five variants describe a credential that is not
//! acceptable; they all collapse to the same unauthorized response at the HTTP
//! boundary. The remaining variants mean the outcome could not be determined
//! at all and are surfaced as service failures.

use std::fmt;

/// Errors that can occur while issuing, validating or revoking tokens.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The bearer header has the wrong shape or its payload is not valid base64,
    /// or the token itself cannot be parsed.
    #[error("Malformed credential: {message}")]
    MalformedCredential {
        /// Description of what could not be parsed.
        message: String,
    },

    /// The MAC does not match or the token names a disallowed algorithm.
    #[error("Bad signature")]
    BadSignature,

    /// The token's expiry is at or before the current time.
    #[error("Token expired")]
    Expired,

    /// An expected claim is absent or has the wrong type.
    #[error("Missing required claim: {claim}")]
    MissingClaim {
        /// Name of the missing claim.
        claim: String,
    },

    /// No session record exists for the token's session identifier.
    #[error("Session not found")]
    SessionNotFound,

    /// The session store could not be reached or timed out.
    #[error("Session store unavailable: {message}")]
    StoreUnavailable {
        /// Description of the store failure.
        message: String,
    },

    /// A claim set could not be signed during issuance.
    #[error("Failed to sign token: {message}")]
    SigningFailure {
        /// Description of the signing failure.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl AuthError {
    /// Creates a new `MalformedCredential` error.
    #[must_use]
    pub fn malformed_credential(message: impl Into<String>) -> Self {
        Self::MalformedCredential {
            message: message.into(),
        }
    }

    /// Creates a new `MissingClaim` error.
    #[must_use]
    pub fn missing_claim(claim: impl Into<String>) -> Self {
        Self::MissingClaim {
            claim: claim.into(),
        }
    }

    /// Creates a new `StoreUnavailable` error.
    #[must_use]
    pub fn store_unavailable(message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `SigningFailure` error.
    #[must_use]
    pub fn signing_failure(message: impl Into<String>) -> Self {
        Self::SigningFailure {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the credential itself was rejected.
    ///
    /// These errors are reported to callers as a single unauthorized outcome.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self,
            Self::MalformedCredential { .. }
                | Self::BadSignature
                | Self::Expired
                | Self::MissingClaim { .. }
                | Self::SessionNotFound
        )
    }

    /// Returns `true` if the system could not determine the outcome.
    #[must_use]
    pub fn is_service_failure(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable { .. } | Self::SigningFailure { .. } | Self::Internal { .. }
        )
    }

    /// Returns the error category for logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::MalformedCredential { .. } => ErrorCategory::Credential,
            Self::BadSignature => ErrorCategory::Token,
            Self::Expired => ErrorCategory::Token,
            Self::MissingClaim { .. } => ErrorCategory::Token,
            Self::SessionNotFound => ErrorCategory::Session,
            Self::StoreUnavailable { .. } => ErrorCategory::Infrastructure,
            Self::SigningFailure { .. } => ErrorCategory::Internal,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of authentication errors for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The bearer credential could not be extracted or decoded.
    Credential,
    /// The token failed signature, expiry or claim checks.
    Token,
    /// The token's session has been revoked or has expired in the store.
    Session,
    /// The session store failed.
    Infrastructure,
    /// Signing or other internal failures.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential => write!(f, "credential"),
            Self::Token => write!(f, "token"),
            Self::Session => write!(f, "session"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
