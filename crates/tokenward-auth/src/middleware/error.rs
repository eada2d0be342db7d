//! Error responses for the authentication gate.
//!
//! Callers learn only whether they are unauthorized or whether the service
//! failed. Which check rejected a credential is logged, never returned.

use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::error::AuthError;

/// `WWW-Authenticate` value sent with every 401.
pub const WWW_AUTHENTICATE_VALUE: &str = "Bearer realm=\"tokenward\"";

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, code) = error_details(&self);

        if self.is_service_failure() {
            tracing::warn!(
                category = %self.category(),
                error = %self,
                "Authentication could not be completed"
            );
        }

        let mut headers = HeaderMap::new();
        if status == StatusCode::UNAUTHORIZED {
            headers.insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static(WWW_AUTHENTICATE_VALUE),
            );
        }

        (status, headers, Json(json!({ "error": code }))).into_response()
    }
}

/// Returns (HTTP status, public error code) for an error.
fn error_details(error: &AuthError) -> (StatusCode, &'static str) {
    match error {
        AuthError::MalformedCredential { .. }
        | AuthError::BadSignature
        | AuthError::Expired
        | AuthError::MissingClaim { .. }
        | AuthError::SessionNotFound => (StatusCode::UNAUTHORIZED, "unauthorized"),
        AuthError::StoreUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable")
        }
        AuthError::SigningFailure { .. } | AuthError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, "server_error")
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn body_of(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_credential_errors_are_indistinguishable() {
        let errors = [
            AuthError::malformed_credential("bad header"),
            AuthError::BadSignature,
            AuthError::Expired,
            AuthError::missing_claim("access_uuid"),
            AuthError::SessionNotFound,
        ];

        for err in errors {
            let response = err.into_response();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
            assert_eq!(
                response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
                WWW_AUTHENTICATE_VALUE
            );
            assert_eq!(body_of(response).await, json!({"error": "unauthorized"}));
        }
    }

    #[tokio::test]
    async fn test_store_outage_is_service_unavailable() {
        let response = AuthError::store_unavailable("redis at 10.0.0.1 refused").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());

        let body = body_of(response).await;
        assert_eq!(body, json!({"error": "service_unavailable"}));
        assert!(!body.to_string().contains("10.0.0.1"));
    }

    #[tokio::test]
    async fn test_signing_failure_is_server_error() {
        let response = AuthError::signing_failure("bad key").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, json!({"error": "server_error"}));
    }
}
