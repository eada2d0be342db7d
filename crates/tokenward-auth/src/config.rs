//! Token configuration.
//!
//! Access and refresh tokens each carry their own secret and lifetime so that
//! a leaked refresh secret cannot be used to mint access tokens and vice versa.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::claims::TokenRole;

/// Token issuance and validation configuration.
///
/// # Example (TOML)
///
/// ```toml
/// [tokens]
/// access_secret = "change-me"
/// access_lifetime = "15m"
/// refresh_secret = "change-me-too"
/// refresh_lifetime = "7d"
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC secret for access tokens.
    pub access_secret: TokenSecret,

    /// Access token lifetime.
    /// Keep short: a stolen access token is usable until revoked or expired.
    #[serde(with = "humantime_serde")]
    pub access_lifetime: Duration,

    /// HMAC secret for refresh tokens. Must differ from the access secret.
    pub refresh_secret: TokenSecret,

    /// Refresh token lifetime.
    #[serde(with = "humantime_serde")]
    pub refresh_lifetime: Duration,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            access_secret: TokenSecret::default(),
            access_lifetime: Duration::from_secs(15 * 60), // 15 minutes
            refresh_secret: TokenSecret::default(),
            refresh_lifetime: Duration::from_secs(7 * 24 * 3600), // 7 days
        }
    }
}

/// A shared HMAC secret. Never printed.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct TokenSecret(String);

impl TokenSecret {
    /// Wraps a secret value.
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Returns the raw secret bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Returns `true` if no secret was configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for TokenSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenSecret(***)")
    }
}

impl From<&str> for TokenSecret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An invalid configuration value was provided.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// A required configuration value is missing.
    #[error("Missing required configuration: {0}")]
    Missing(String),
}

impl TokenConfig {
    /// Creates a configuration from explicit secrets with default lifetimes.
    #[must_use]
    pub fn with_secrets(access: impl Into<String>, refresh: impl Into<String>) -> Self {
        Self {
            access_secret: TokenSecret::new(access),
            refresh_secret: TokenSecret::new(refresh),
            ..Self::default()
        }
    }

    /// Sets the access token lifetime.
    #[must_use]
    pub fn with_access_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_lifetime = lifetime;
        self
    }

    /// Sets the refresh token lifetime.
    #[must_use]
    pub fn with_refresh_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_lifetime = lifetime;
        self
    }

    /// Returns the signing secret for a role.
    #[must_use]
    pub fn secret(&self, role: TokenRole) -> &TokenSecret {
        match role {
            TokenRole::Access => &self.access_secret,
            TokenRole::Refresh => &self.refresh_secret,
        }
    }

    /// Returns the token lifetime for a role.
    #[must_use]
    pub fn lifetime(&self, role: TokenRole) -> Duration {
        match role {
            TokenRole::Access => self.access_lifetime,
            TokenRole::Refresh => self.refresh_lifetime,
        }
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` if either secret is empty, and
    /// `ConfigError::InvalidValue` if a lifetime is shorter than one second or
    /// both roles share the same secret.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for role in [TokenRole::Access, TokenRole::Refresh] {
            if self.secret(role).is_empty() {
                return Err(ConfigError::Missing(format!("tokens.{role}_secret")));
            }
            if self.lifetime(role) < Duration::from_secs(1) {
                return Err(ConfigError::InvalidValue(format!(
                    "tokens.{role}_lifetime must be at least 1s"
                )));
            }
        }

        if self.access_secret == self.refresh_secret {
            return Err(ConfigError::InvalidValue(
                "access and refresh secrets must differ".to_string(),
            ));
        }

        Ok(())
    }
}
