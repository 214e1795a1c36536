use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;

#[derive(Debug, Clone)]
pub(crate) struct Config {
    pub(crate) api_base: String,

    pub(crate) top_stories_limit: usize,
    pub(crate) fetch_window: usize,

    pub(crate) item_cache_ttl: Duration,
    pub(crate) item_cache_sweep_interval: Duration,
    pub(crate) request_timeout: Duration,

    pub(crate) listen_addr: SocketAddr,
    pub(crate) log_dir: PathBuf,
    pub(crate) log_to_console: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: crate::hn_api::DEFAULT_API_BASE.to_string(),
            top_stories_limit: crate::top_stories::DEFAULT_LIMIT,
            fetch_window: crate::top_stories::DEFAULT_WINDOW,
            item_cache_ttl: Duration::from_secs(5 * 60),
            item_cache_sweep_interval: Duration::from_secs(10 * 60),
            request_timeout: Duration::from_secs(10),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_dir: PathBuf::from("./log"),
            log_to_console: false,
        }
    }
}

impl Config {
    /// Reads the process environment, after loading `.env` if there is one.
    pub(crate) fn from_env() -> anyhow::Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to load .env file");
            }
        }

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Every key is optional; unset keys keep their default.
    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let text = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let config = Self {
            api_base: text("HN_API_BASE").unwrap_or(defaults.api_base),
            top_stories_limit: parse_or(&lookup, "TOP_STORIES_LIMIT", defaults.top_stories_limit)?,
            fetch_window: parse_or(&lookup, "FETCH_WINDOW", defaults.fetch_window)?,
            item_cache_ttl: secs_or(&lookup, "ITEM_CACHE_TTL_SECS", defaults.item_cache_ttl)?,
            item_cache_sweep_interval: secs_or(
                &lookup,
                "ITEM_CACHE_SWEEP_SECS",
                defaults.item_cache_sweep_interval,
            )?,
            request_timeout: secs_or(&lookup, "REQUEST_TIMEOUT_SECS", defaults.request_timeout)?,
            listen_addr: parse_or(&lookup, "LISTEN_ADDR", defaults.listen_addr)?,
            log_dir: text("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
            log_to_console: parse_or(&lookup, "LOG_TO_CONSOLE", defaults.log_to_console)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub(crate) fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.fetch_window > 0, "FETCH_WINDOW must be greater than 0");
        anyhow::ensure!(
            !self.item_cache_sweep_interval.is_zero(),
            "ITEM_CACHE_SWEEP_SECS must be greater than 0"
        );
        anyhow::ensure!(
            !self.request_timeout.is_zero(),
            "REQUEST_TIMEOUT_SECS must be greater than 0"
        );
        Ok(())
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key).map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => value
            .parse()
            .with_context(|| format!("Invalid value for {key}: {value:?}")),
        _ => Ok(default),
    }
}

fn secs_or(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: Duration,
) -> anyhow::Result<Duration> {
    Ok(Duration::from_secs(parse_or(lookup, key, default.as_secs())?))
}
