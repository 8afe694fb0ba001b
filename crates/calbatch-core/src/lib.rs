pub mod config;
pub mod error;

pub use config::{
    ApiConfig, AuthConfig, BatchConfig, Config, CopyConfig, ErrorPolicy, SelectorConfig,
    ValidationResult,
};
pub use error::{AppError, AuthError, ConfigError, SelectionError};

use anyhow::Result;

/// Initialize logging for the command line tool.
///
/// `RUST_LOG` wins when set; otherwise `verbosity` picks the level
/// (0 = warn, 1 = info, 2 = debug, 3+ = trace). Output goes to stderr so
/// stdout only carries listing output.
pub fn init(verbosity: u8) -> Result<()> {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    tracing::debug!("calbatch core initialized");
    Ok(())
}
