use std::time::Duration;
use std::{env, fs};

use tokenward_server::StoreBackend;
use tokenward_server::config::loader::load_config;

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("tokenward.toml");

    let toml_content = r#"
[server]
host = "127.0.0.1"
port = 8081

[tokens]
access_secret = "file-access-secret"
access_lifetime = "10m"
refresh_secret = "file-refresh-secret"

[store]
backend = "redis"

[store.redis]
url = "redis://cache:6379"
timeout_ms = 250

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses; omitted fields keep their defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.server.port, 8081);
    assert_eq!(cfg.tokens.access_lifetime, Duration::from_secs(600));
    assert_eq!(cfg.tokens.refresh_lifetime, Duration::from_secs(7 * 24 * 3600));
    assert_eq!(cfg.store.backend, StoreBackend::Redis);
    assert_eq!(cfg.store.redis.url, "redis://cache:6379");
    assert_eq!(cfg.store.redis.pool_size, 10);
    assert_eq!(cfg.store.redis.timeout_ms, 250);
    assert_eq!(cfg.logging.level, "debug");

    // 2) Env override should win over file
    unsafe {
        env::set_var("TOKENWARD__SERVER__PORT", "9090");
        env::set_var("TOKENWARD__TOKENS__REFRESH_LIFETIME", "1day");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.server.port, 9090);
    assert_eq!(cfg_env.tokens.refresh_lifetime, Duration::from_secs(24 * 3600));
    unsafe {
        env::remove_var("TOKENWARD__SERVER__PORT");
        env::remove_var("TOKENWARD__TOKENS__REFRESH_LIFETIME");
    }

    // 3) Shared secrets are rejected
    let invalid_path = dir.path().join("invalid.toml");
    let invalid_toml = r#"
[tokens]
access_secret = "same"
refresh_secret = "same"
"#;
    fs::write(&invalid_path, invalid_toml).expect("write invalid toml");
    let err = load_config(invalid_path.to_str()).expect_err("expected validation error");
    assert!(err.contains("secrets must differ"), "{err}");

    // 4) Missing secrets are rejected
    let empty_path = dir.path().join("empty.toml");
    fs::write(&empty_path, "[server]\nport = 8080\n").expect("write empty toml");
    let err = load_config(empty_path.to_str()).expect_err("expected missing secret");
    assert!(err.contains("tokens.access_secret"), "{err}");
}
