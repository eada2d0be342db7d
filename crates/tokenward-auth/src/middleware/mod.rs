//! HTTP authentication gate.
//!
//! This module provides the Axum side of token validation:
//!
//! - Bearer header extraction and base64 decoding
//! - Access token validation through [`TokenValidator`](crate::TokenValidator)
//! - A uniform unauthorized response that never says which check failed
//!
//! # Example
//!
//! ```ignore
//! use axum::{Router, routing::get};
//! use tokenward_auth::middleware::{AuthState, BearerAuth};
//!
//! async fn protected_handler(BearerAuth(claims): BearerAuth) -> String {
//!     format!("Hello, user {}!", claims.user_id())
//! }
//!
//! let app = Router::new()
//!     .route("/protected", get(protected_handler))
//!     .with_state(auth_state);
//! ```

pub mod auth;
pub mod error;

pub use auth::{AuthState, BearerAuth, authenticate, parse_bearer};
