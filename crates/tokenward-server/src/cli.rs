use anyhow::Result;
use base64::{Engine, engine::general_purpose::STANDARD};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tokenward_auth::prelude::*;

use crate::config::{AppConfig, StoreBackend};
use crate::server::AppState;

#[derive(Parser)]
#[command(name = "tokenward")]
#[command(about = "Tokenward: signed session tokens with store-backed revocation")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (overrides TOKENWARD_CONFIG env var)
    #[arg(short, long, global = true, env = "TOKENWARD_CONFIG")]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service (default)
    Serve,
    /// Issue a token pair for a user
    Issue(IssueArgs),
    /// Revoke a session by identifier
    Revoke(RevokeArgs),
}

#[derive(Args)]
pub struct IssueArgs {
    /// Principal to issue tokens for
    #[arg(long)]
    pub user_id: u64,
}

#[derive(Args)]
pub struct RevokeArgs {
    /// Access or refresh session identifier
    #[arg(long)]
    pub session_id: String,
}

/// Issued pair as printed by `tokenward issue`.
#[derive(Debug, Serialize)]
pub struct IssuedSession {
    #[serde(flatten)]
    pub pair: TokenPair,
    /// Ready-to-send `Authorization` header value for the access token.
    pub access_bearer: String,
    /// `Authorization` header value for the refresh token.
    pub refresh_bearer: String,
}

/// Formats a token as an `Authorization` header value.
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {}", STANDARD.encode(token))
}

/// Fails unless sessions outlive this process.
///
/// Records written to the in-memory store vanish when the command exits, so
/// issued tokens could never validate against a running server and revocation
/// would never find a session.
fn require_shared_store(cfg: &AppConfig, command: &str) -> Result<()> {
    if cfg.store.backend == StoreBackend::Memory {
        anyhow::bail!(
            "{command} requires a shared store backend; set store.backend = \"redis\" \
             (the memory store does not outlive this command)"
        );
    }
    Ok(())
}

pub async fn issue(cfg: &AppConfig, args: &IssueArgs) -> Result<IssuedSession> {
    require_shared_store(cfg, "issue")?;
    let state = AppState::from_config(cfg).await?;
    issue_with(&state, args).await
}

/// Issues a pair through an already wired state.
pub async fn issue_with(state: &AppState, args: &IssueArgs) -> Result<IssuedSession> {
    let pair = state.issuer.issue(args.user_id).await?;
    tracing::info!(user_id = pair.user_id, access_uuid = %pair.access_uuid, "Issued token pair");

    Ok(IssuedSession {
        access_bearer: bearer_header(&pair.access_token),
        refresh_bearer: bearer_header(&pair.refresh_token),
        pair,
    })
}

pub async fn revoke(cfg: &AppConfig, args: &RevokeArgs) -> Result<u64> {
    require_shared_store(cfg, "revoke")?;
    let state = AppState::from_config(cfg).await?;
    let user_id = state.revoker.revoke_session(&args.session_id).await?;
    Ok(user_id)
}
