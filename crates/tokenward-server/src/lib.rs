pub mod cli;
pub mod config;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig, StoreBackend, StoreConfig};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, TokenwardServer, build_router, build_store};
