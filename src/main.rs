//! palabra-bot — entry point.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config (fails fast on missing secrets)
//!   3. Init logger once (CLI `-v` flags > `RUST_LOG` > config)
//!   4. Build the completion provider and the word relay
//!   5. Spawn Ctrl-C → shutdown signal watcher
//!   6. Run comms channels until shutdown

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use palabra_bot::error::AppError;
use palabra_bot::relay::WordRelay;
use palabra_bot::{config, llm, logger, subsystems};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // .env is optional.
    let _ = dotenvy::dotenv();

    let args = parse_cli_args(std::env::args().skip(1));

    let config = config::load(args.config_path.as_deref())?;

    let log_filter = logger::init(&config, args.log_level)?;

    info!(
        bot_name = %config.bot_name,
        configured_log_level = %config.log_level,
        log_filter = %log_filter,
        interactive = args.interactive,
        provider = %config.llm.provider,
        model = %config.llm.model,
        "config loaded"
    );

    let provider = llm::providers::build(&config.llm, Some(config.llm_api_key.expose().to_string()))
        .map_err(|e| AppError::Config(e.to_string()))?;
    let relay = Arc::new(WordRelay::new(provider));

    let shutdown = CancellationToken::new();

    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, initiating shutdown");
            ctrlc_token.cancel();
        }
    });

    info!("bot started");

    let comms = subsystems::comms::start(&config, args.interactive, relay, shutdown.clone());
    let result = comms.join().await;

    shutdown.cancel();
    info!("bot stopped");
    result
}

struct CliArgs {
    log_level: Option<&'static str>,
    interactive: bool,
    config_path: Option<String>,
}

fn parse_cli_args(args: impl IntoIterator<Item = String>) -> CliArgs {
    let mut verbosity = 0u8;
    let mut interactive = false;
    let mut config_path = None;

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        if arg == "--" {
            break;
        }

        match arg.as_str() {
            "-h" | "--help" => {
                println!("Usage: palabra-bot [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -h, --help                 Print help");
                println!("  -i, --interactive          Also run the console channel");
                println!("  -f, --config <PATH>        Path to configuration file (default: config/default.toml)");
                println!("  -v, -vv, -vvv, -vvvv       Set logging verbosity (warn, info, debug, trace)");
                println!();
                println!("Environment:");
                println!("  TELEGRAM_TOKEN             Telegram bot token (required)");
                println!("  DEEPSEEK_API_KEY           Completion API key (required)");
                println!("  PALABRA_LOG_LEVEL          Overrides bot.log_level");
                std::process::exit(0);
            }
            "-i" | "--interactive" => interactive = true,
            "-f" | "--config" => {
                if let Some(path) = iter.next() {
                    config_path = Some(path);
                } else {
                    eprintln!("error: -f/--config requires a path argument");
                    std::process::exit(1);
                }
            }
            "--verbose" => verbosity = verbosity.saturating_add(1),
            a => {
                if let Some(count) = verbosity_flag(a) {
                    verbosity = verbosity.saturating_add(count);
                }
            }
        }
    }

    CliArgs { log_level: level_for(verbosity), interactive, config_path }
}

/// Number of `v`s in a `-v`, `-vv`, … flag; `None` for anything else.
fn verbosity_flag(arg: &str) -> Option<u8> {
    let vs = arg.strip_prefix('-')?;
    if vs.is_empty() || !vs.chars().all(|c| c == 'v') {
        return None;
    }
    Some(u8::try_from(vs.len()).unwrap_or(u8::MAX))
}

fn level_for(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("warn"),
        2 => Some("info"),
        3 => Some("debug"),
        _ => Some("trace"),
    }
}
