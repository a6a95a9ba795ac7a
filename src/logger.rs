//! Logging setup: one `tracing-subscriber` fmt layer on stderr.
//!
//! Filter precedence: a `-v` flag on the command line, then `RUST_LOG`, then
//! `bot.log_level` from [`Config`] (itself overridable by
//! `PALABRA_LOG_LEVEL`). The configured level is validated at load time.

use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::AppError;

/// Pick the filter directives to install.
///
/// A blank `RUST_LOG` counts as unset so an empty variable in `.env` does
/// not silence the bot.
pub fn resolve_directives(cli_level: Option<&str>, rust_log: Option<&str>, configured: &str) -> String {
    cli_level
        .or(rust_log.map(str::trim).filter(|d| !d.is_empty()))
        .unwrap_or(configured)
        .to_string()
}

/// Install the global subscriber for this process and return the directives
/// it filters with.
pub fn init(config: &Config, cli_level: Option<&str>) -> Result<String, AppError> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directives = resolve_directives(cli_level, rust_log.as_deref(), &config.log_level);

    let filter = EnvFilter::try_new(&directives)
        .map_err(|e| AppError::Logger(format!("invalid log filter '{directives}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| AppError::Logger(format!("failed to set subscriber: {e}")))?;

    Ok(directives)
}
