//! Configuration loading with env-var overrides.
//!
//! Reads an optional TOML file (`-f <PATH>` or `config/default.toml`), falls
//! back to built-in defaults for anything missing, then applies the
//! `PALABRA_LOG_LEVEL` override. Secrets (`TELEGRAM_TOKEN`,
//! `DEEPSEEK_API_KEY`) come from the environment only and are required.

use std::{
    env, fmt, fs,
    path::Path,
};

use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::error::AppError;

/// Path tried when no `--config` argument is given.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";
pub const ENV_LLM_API_KEY: &str = "DEEPSEEK_API_KEY";
pub const ENV_LOG_LEVEL: &str = "PALABRA_LOG_LEVEL";

/// A secret string that never shows up in `Debug` output or logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(***)")
    }
}

/// Telegram channel configuration.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub enabled: bool,
}

/// Console channel configuration. Only honoured in interactive runs.
#[derive(Debug, Clone)]
pub struct PtyConfig {
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct CommsConfig {
    pub telegram: TelegramConfig,
    pub pty: PtyConfig,
}

/// Completion provider configuration, from `[llm]` / `[llm.openai]`.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Active provider (`"deepseek"`, `"openai"`, `"openai-compatible"`, `"dummy"`).
    pub provider: String,
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub model: String,
    /// Sent only when set.
    pub temperature: Option<f32>,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// Fully-resolved bot configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_name: String,
    pub log_level: String,
    pub comms: CommsConfig,
    pub llm: LlmConfig,
    pub telegram_token: Secret,
    pub llm_api_key: Secret,
}

/// Environment values consulted by the loader.
///
/// Tests build this directly instead of mutating the process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvVars {
    pub telegram_token: Option<String>,
    pub llm_api_key: Option<String>,
    pub log_level: Option<String>,
}

impl EnvVars {
    pub fn from_process() -> Self {
        Self {
            telegram_token: env::var(ENV_TELEGRAM_TOKEN).ok(),
            llm_api_key: env::var(ENV_LLM_API_KEY).ok(),
            log_level: env::var(ENV_LOG_LEVEL).ok(),
        }
    }
}

/// Raw TOML shape — `serde` target before resolution.
#[derive(Deserialize, Default)]
struct RawConfig {
    #[serde(default)]
    bot: RawBot,
    #[serde(default)]
    comms: RawComms,
    #[serde(default)]
    llm: RawLlm,
}

#[derive(Deserialize)]
struct RawBot {
    #[serde(default = "default_bot_name")]
    name: String,
    #[serde(default = "default_log_level")]
    log_level: String,
}

impl Default for RawBot {
    fn default() -> Self {
        Self { name: default_bot_name(), log_level: default_log_level() }
    }
}

#[derive(Deserialize, Default)]
struct RawComms {
    #[serde(default)]
    telegram: RawChannel,
    #[serde(default)]
    pty: RawChannel,
}

#[derive(Deserialize)]
struct RawChannel {
    #[serde(default = "default_true")]
    enabled: bool,
}

impl Default for RawChannel {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Deserialize)]
struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    provider: String,
    #[serde(default)]
    openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
struct RawOpenAiConfig {
    #[serde(default = "default_api_base_url")]
    api_base_url: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default)]
    temperature: Option<f32>,
    #[serde(default = "default_timeout_seconds")]
    timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            temperature: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_bot_name() -> String { "palabra-bot".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_llm_provider() -> String { "deepseek".to_string() }
fn default_api_base_url() -> String { "https://api.deepseek.com/chat/completions".to_string() }
fn default_model() -> String { "deepseek-chat".to_string() }
fn default_timeout_seconds() -> u64 { 45 }
fn default_true() -> bool { true }

/// Load configuration from the process environment.
///
/// An explicit `config_path` must exist. Without one, `config/default.toml`
/// is used when present and built-in defaults otherwise.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let env = EnvVars::from_process();
    match config_path {
        Some(path) => load_from(Some(Path::new(path)), env),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            load_from(default_path.exists().then_some(default_path), env)
        }
    }
}

/// Internal loader — accepts an explicit file and environment snapshot.
pub fn load_from(path: Option<&Path>, env: EnvVars) -> Result<Config, AppError> {
    let raw = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
            toml::from_str::<RawConfig>(&text)
                .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?
        }
        None => RawConfig::default(),
    };

    let telegram_token = require_secret(env.telegram_token, ENV_TELEGRAM_TOKEN)?;
    let llm_api_key = require_secret(env.llm_api_key, ENV_LLM_API_KEY)?;

    let log_level = env.log_level.unwrap_or(raw.bot.log_level);
    validate_log_level(&log_level)?;

    let openai = raw.llm.openai;
    if openai.timeout_seconds == 0 {
        return Err(AppError::Config("llm.openai.timeout_seconds must be greater than zero".into()));
    }

    Ok(Config {
        bot_name: raw.bot.name,
        log_level,
        comms: CommsConfig {
            telegram: TelegramConfig { enabled: raw.comms.telegram.enabled },
            pty: PtyConfig { enabled: raw.comms.pty.enabled },
        },
        llm: LlmConfig {
            provider: raw.llm.provider,
            api_base_url: openai.api_base_url,
            model: openai.model,
            temperature: openai.temperature,
            timeout_seconds: openai.timeout_seconds,
        },
        telegram_token,
        llm_api_key,
    })
}

/// `bot.log_level` must be a bare level (`error` … `trace`, or `off`);
/// per-target directives belong in `RUST_LOG`.
fn validate_log_level(level: &str) -> Result<LevelFilter, AppError> {
    // `LevelFilter` reads "" as ERROR.
    if level.trim().is_empty() {
        return Err(AppError::Config("bot.log_level must not be empty".into()));
    }
    level
        .parse::<LevelFilter>()
        .map_err(|_| AppError::Config(format!("bot.log_level: unrecognised log level '{level}'")))
}

fn require_secret(value: Option<String>, name: &str) -> Result<Secret, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(Secret(v)),
        _ => Err(AppError::Config(format!("{name} must be set in the environment"))),
    }
}

// ── test helpers ──────────────────────────────────────────────────────────────

impl Config {
    /// Safe `Config` for tests — dummy LLM, placeholder secrets, no channels.
    pub fn test_default() -> Self {
        Self {
            bot_name: "test".into(),
            log_level: "info".into(),
            comms: CommsConfig {
                telegram: TelegramConfig { enabled: false },
                pty: PtyConfig { enabled: false },
            },
            llm: LlmConfig {
                provider: "dummy".into(),
                api_base_url: default_api_base_url(),
                model: default_model(),
                temperature: None,
                timeout_seconds: default_timeout_seconds(),
            },
            telegram_token: Secret("test-telegram-token".into()),
            llm_api_key: Secret("test-api-key".into()),
        }
    }
}
