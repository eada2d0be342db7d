//! Integration tests for the Redis session store.
//!
//! Tests use testcontainers to spin up a real Redis instance.

use std::sync::Arc;
use std::time::Duration;

use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::redis::Redis;
use tokenward_auth::prelude::*;
use tokenward_redis::{RedisConfig, RedisSessionStore};
use tokio::sync::OnceCell;

// Shared Redis container for all tests
static SHARED_REDIS: OnceCell<(ContainerAsync<Redis>, String)> = OnceCell::const_new();

async fn get_redis_url() -> String {
    let (_, url) = SHARED_REDIS
        .get_or_init(|| async {
            let container = Redis::default()
                .start()
                .await
                .expect("start redis container");

            let host_port = container.get_host_port_ipv4(6379).await.expect("get port");
            let url = format!("redis://127.0.0.1:{host_port}");

            (container, url)
        })
        .await;

    url.clone()
}

async fn connect() -> RedisSessionStore {
    let config = RedisConfig {
        url: get_redis_url().await,
        pool_size: 4,
        timeout_ms: 2000,
    };
    RedisSessionStore::connect(&config)
        .await
        .expect("connect to redis")
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_set_get_delete() {
    let store = connect().await;

    store
        .set("sess-basic", "42", Duration::from_secs(60))
        .await
        .unwrap();
    assert_eq!(store.get("sess-basic").await.unwrap().as_deref(), Some("42"));

    assert_eq!(
        store.delete("sess-basic").await.unwrap().as_deref(),
        Some("42")
    );
    assert_eq!(store.get("sess-basic").await.unwrap(), None);
    assert_eq!(store.delete("sess-basic").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_record_expires() {
    let store = connect().await;

    store
        .set("sess-expiring", "7", Duration::from_millis(150))
        .await
        .unwrap();
    assert!(store.get("sess-expiring").await.unwrap().is_some());

    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(store.get("sess-expiring").await.unwrap(), None);
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn test_token_lifecycle_over_redis() {
    let store = Arc::new(connect().await);
    let config = TokenConfig::with_secrets("redis-access-secret", "redis-refresh-secret");
    let signer = Arc::new(HmacSigner::from_config(&config));

    let issuer = TokenIssuer::new(signer.clone(), store.clone(), &config);
    let validator = TokenValidator::new(signer, store.clone());
    let revoker = TokenRevoker::new(store.clone());

    let pair = issuer.issue(42).await.unwrap();
    assert_eq!(
        store.get(&pair.access_uuid).await.unwrap().as_deref(),
        Some("42")
    );
    assert_eq!(
        store.get(&pair.refresh_uuid).await.unwrap().as_deref(),
        Some("42")
    );

    let claims = validator
        .validate(&pair.access_token, TokenRole::Access)
        .await
        .unwrap();
    assert_eq!(revoker.revoke(&claims).await.unwrap(), 42);

    assert!(matches!(
        validator.validate(&pair.access_token, TokenRole::Access).await,
        Err(AuthError::SessionNotFound)
    ));
    assert!(
        validator
            .validate(&pair.refresh_token, TokenRole::Refresh)
            .await
            .is_ok()
    );
}
