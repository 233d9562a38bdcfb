use std::env;
use std::fs as stdfs;
use std::path::{Path, PathBuf};

use action_locator::SearchConfig;
use anyhow::{Context, Result};
use tokio::fs;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

pub const ENV_TIMEOUT_MS: &str = "UIQUERY_TIMEOUT_MS";
pub const ENV_WAIT: &str = "UIQUERY_WAIT";
pub const ENV_REPORT_ERRORS: &str = "UIQUERY_REPORT_ERRORS";
pub const ENV_REGEX_VALUES: &str = "UIQUERY_REGEX_VALUES";
pub const ENV_ALL_OS_WINDOWS: &str = "UIQUERY_ALL_OS_WINDOWS";
pub const ENV_ALL_TOP_LEVEL: &str = "UIQUERY_ALL_TOP_LEVEL";

/// Load `KEY=value` lines from `config/local.env` without overriding the
/// real environment.
pub fn load_local_env_overrides() {
    let path = Path::new("config/local.env");
    if !path.exists() {
        return;
    }

    match stdfs::read_to_string(path) {
        Ok(contents) => {
            for (idx, raw_line) in contents.lines().enumerate() {
                let line = raw_line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }
                let Some((key, value)) = line.split_once('=') else {
                    warn!(line = idx + 1, "invalid local.env entry; skipping");
                    continue;
                };
                let key = key.trim();
                if key.is_empty() || env::var(key).is_ok() {
                    continue;
                }
                env::set_var(key, unquote(value.trim()));
            }
            info!(path = %path.display(), "Loaded environment overrides from local.env");
        }
        Err(err) => {
            warn!(path = %path.display(), ?err, "failed to read local.env overrides");
        }
    }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(value)
}

/// Install the global subscriber. Logs go to stderr so command output stays parseable.
pub fn init_logging(level: &str, debug: bool) -> Result<()> {
    let level = if debug {
        tracing::Level::DEBUG
    } else {
        level.parse().context("Invalid log level")?
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level.to_string())),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    Ok(())
}

pub struct LoadedConfig {
    pub config: Config,
    pub path: PathBuf,
}

pub fn default_config_path() -> Result<PathBuf> {
    // Priority: ./config/uiquery.yaml > ~/.config/uiquery/config.yaml
    let local_config = PathBuf::from("config/uiquery.yaml");
    if local_config.exists() {
        return Ok(local_config);
    }
    let mut path = dirs::config_dir().context("Failed to get config directory")?;
    path.push("uiquery");
    path.push("config.yaml");
    Ok(path)
}

pub async fn load_config(config_path: Option<&PathBuf>) -> Result<LoadedConfig> {
    let config_path = match config_path {
        Some(path) => path.clone(),
        None => default_config_path()?,
    };

    if config_path.exists() {
        let content = fs::read_to_string(&config_path)
            .await
            .with_context(|| format!("Failed to read config file {}", config_path.display()))?;

        let config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config file")?;

        info!("Loaded configuration from: {}", config_path.display());
        Ok(LoadedConfig {
            config,
            path: config_path,
        })
    } else {
        warn!(
            "Config file not found, using defaults: {}",
            config_path.display()
        );
        Ok(LoadedConfig {
            config: Config::default(),
            path: config_path,
        })
    }
}

/// Apply `UIQUERY_*` environment variables on top of the file configuration.
/// Unparseable values are ignored with a warning.
pub fn apply_env_overrides(search: &mut SearchConfig) {
    if let Some(timeout_ms) = env_value(ENV_TIMEOUT_MS, |raw| raw.parse::<u64>().ok()) {
        search.timeout_ms = timeout_ms;
    }
    for (key, slot) in [
        (ENV_WAIT, &mut search.wait_for_element),
        (ENV_REPORT_ERRORS, &mut search.report_errors),
        (ENV_REGEX_VALUES, &mut search.use_regex_values),
        (ENV_ALL_OS_WINDOWS, &mut search.include_all_os_windows),
        (ENV_ALL_TOP_LEVEL, &mut search.search_from_all_top_level_windows),
    ] {
        if let Some(value) = env_value(key, parse_flag) {
            *slot = value;
        }
    }
}

fn env_value<T>(key: &str, parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let raw = env::var(key).ok()?;
    let parsed = parse(raw.trim());
    if parsed.is_none() {
        warn!(key, value = %raw, "ignoring invalid environment override");
    } else {
        info!(key, value = %raw, "applied environment override");
    }
    parsed
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
