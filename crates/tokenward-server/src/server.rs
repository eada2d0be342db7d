use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{FromRef, State},
    routing::{get, post},
};
use serde_json::{Value, json};
use tokenward_auth::prelude::*;
use tokenward_redis::RedisSessionStore;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::{AppConfig, StoreBackend, StoreConfig};

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthState,
    pub issuer: Arc<TokenIssuer>,
    pub revoker: Arc<TokenRevoker>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        state.auth.clone()
    }
}

impl AppState {
    /// Wires the signer, issuer, validator and revoker around one store.
    pub fn new(tokens: &TokenConfig, store: Arc<dyn SessionStore>) -> Self {
        let signer: Arc<dyn TokenSigner> = Arc::new(HmacSigner::from_config(tokens));
        let validator = Arc::new(TokenValidator::new(signer.clone(), store.clone()));

        Self {
            auth: AuthState::new(validator),
            issuer: Arc::new(TokenIssuer::new(signer, store.clone(), tokens)),
            revoker: Arc::new(TokenRevoker::new(store)),
        }
    }

    /// Builds the state from configuration, connecting to the configured store.
    pub async fn from_config(cfg: &AppConfig) -> AuthResult<Self> {
        let store = build_store(&cfg.store).await?;
        Ok(Self::new(&cfg.tokens, store))
    }
}

/// Creates the session store selected by `store.backend`.
///
/// A Redis backend that cannot be reached is an error; there is no silent
/// fallback to the in-memory store.
pub async fn build_store(cfg: &StoreConfig) -> AuthResult<Arc<dyn SessionStore>> {
    tracing::info!(backend = %cfg.backend, "Initializing session store");
    match cfg.backend {
        StoreBackend::Memory => Ok(Arc::new(MemorySessionStore::new())),
        StoreBackend::Redis => Ok(Arc::new(RedisSessionStore::connect(&cfg.redis).await?)),
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/auth/session", get(current_session))
        .route("/auth/logout", post(logout))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Returns the validated access claims of the caller.
async fn current_session(BearerAuth(claims): BearerAuth) -> Json<ClaimSet> {
    Json(claims)
}

/// Revokes the caller's access session.
async fn logout(
    State(state): State<AppState>,
    BearerAuth(claims): BearerAuth,
) -> Result<Json<Value>, AuthError> {
    let user_id = state.revoker.revoke(&claims).await?;
    tracing::info!(user_id, session_id = %claims.session_id(), "Logged out");
    Ok(Json(json!({ "user_id": user_id })))
}

pub struct TokenwardServer {
    addr: SocketAddr,
    app: Router,
}

impl TokenwardServer {
    pub async fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let state = AppState::from_config(cfg).await?;
        Ok(Self {
            addr: cfg.addr(),
            app: build_router(state),
        })
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
