use std::{env, path::PathBuf};

use anyhow::Context;
use tollgate_auth::secret::{generate_client_secret, hash_client_secret};
use tollgate_server::config::loader::{DEFAULT_CONFIG_FILE, load_config};
use tollgate_server::{ServerBuilder, observability, start_config_watcher};

/// How the configuration path was determined.
#[derive(Debug, Clone, Copy)]
enum ConfigSource {
    /// From --config CLI argument
    CliArgument,
    /// From TOLLGATE_CONFIG environment variable
    EnvironmentVariable,
    /// Default path (tollgate.toml)
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CliArgument => write!(f, "CLI argument (--config)"),
            Self::EnvironmentVariable => write!(f, "environment variable (TOLLGATE_CONFIG)"),
            Self::Default => write!(f, "default"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(ref io_err) if io_err.kind() == std::io::ErrorKind::NotFound)
        {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    // `tollgate-server hash-secret [SECRET]` prints a PHC hash for a client registration.
    if env::args().nth(1).as_deref() == Some("hash-secret") {
        return print_secret_hash(env::args().nth(2));
    }

    observability::init_tracing();

    let (config_path, source) = resolve_config_path();

    let cfg = load_config(Some(config_path.as_str()))
        .map_err(anyhow::Error::msg)
        .context("configuration error")?;

    tracing::info!(
        path = %config_path,
        source = %source,
        token_path = %cfg.server.token_path,
        token_format = ?cfg.auth.oauth.token_format,
        "Configuration loaded"
    );

    observability::apply_logging_level(&cfg.logging.level);

    let server = ServerBuilder::new()
        .with_config(cfg)
        .build()
        .context("server initialization failed")?;

    let _watcher = start_config_watcher(PathBuf::from(&config_path), server.clients());

    server.run().await
}

fn print_secret_hash(secret: Option<String>) -> anyhow::Result<()> {
    let generated = secret.is_none();
    let secret = secret.unwrap_or_else(generate_client_secret);
    let hash = hash_client_secret(&secret)
        .map_err(|e| anyhow::anyhow!("failed to hash secret: {e}"))?;

    if generated {
        println!("client_secret: {secret}");
    }
    println!("client_secret hash: {hash}");
    Ok(())
}

/// Resolve the configuration file path.
///
/// Priority order:
/// 1. CLI argument: --config <path>
/// 2. Environment variable: TOLLGATE_CONFIG
/// 3. Default: tollgate.toml
fn resolve_config_path() -> (String, ConfigSource) {
    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            if let Some(path) = args.next() {
                return (path, ConfigSource::CliArgument);
            }
        }
    }

    if let Ok(path) = env::var("TOLLGATE_CONFIG") {
        if !path.is_empty() {
            return (path, ConfigSource::EnvironmentVariable);
        }
    }

    (DEFAULT_CONFIG_FILE.to_string(), ConfigSource::Default)
}
