pub mod config;
pub mod config_watch;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig};
pub use config_watch::start_config_watcher;
pub use observability::{apply_logging_level, init_tracing};
pub use server::{ServerBuilder, TollgateServer, build_app};
