use anyhow::{Context, Result};
use clap::Parser;

use tokenward_server::cli::{self, Cli, Commands};
use tokenward_server::config::loader::{DEFAULT_CONFIG_PATH, load_config};
use tokenward_server::{TokenwardServer, observability};

#[tokio::main]
async fn main() {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        // Not an error if .env doesn't exist - it's optional
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    observability::init_tracing();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

    let cfg = match load_config(Some(config_path)) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(2);
        }
    };

    tracing::info!(path = %config_path, store = %cfg.store.backend, "Configuration loaded");
    observability::apply_logging_level(&cfg.logging.level);

    if let Err(e) = run(cli.command.unwrap_or(Commands::Serve), &cfg).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(command: Commands, cfg: &tokenward_server::AppConfig) -> Result<()> {
    match command {
        Commands::Serve => {
            let server = TokenwardServer::from_config(cfg)
                .await
                .context("server initialization failed")?;
            server.run().await?;
        }
        Commands::Issue(args) => {
            let issued = cli::issue(cfg, &args).await?;
            println!("{}", serde_json::to_string_pretty(&issued)?);
        }
        Commands::Revoke(args) => {
            let user_id = cli::revoke(cfg, &args).await?;
            println!("{}", serde_json::json!({ "user_id": user_id }));
        }
    }
    Ok(())
}
