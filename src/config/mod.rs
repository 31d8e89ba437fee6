use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

use crate::loader::default_focus_tickers;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub universe: UniverseConfig,
    #[serde(default)]
    pub display: DisplayOptions,
}

/// Market-data service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SourceConfig {
    #[serde(default = "default_chart_url")]
    pub chart_url: String,

    #[serde(default = "default_summary_url")]
    pub summary_url: String,

    /// Page visited once to obtain session cookies before asking for a crumb.
    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,

    #[serde(default = "default_crumb_url")]
    pub crumb_url: String,

    #[serde(default = "default_true")]
    pub use_crumb: bool,

    #[serde(default = "default_history_range")]
    pub history_range: String,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,

    #[serde(default = "default_jitter_ms")]
    pub jitter_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// Memoization of fetch results
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

/// Pipeline configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    #[serde(default)]
    pub pool_size: PoolSize,

    /// When false, only the static fallback table is used.
    #[serde(default = "default_true")]
    pub dynamic_benchmarks: bool,
}

/// Ticker universes
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UniverseConfig {
    #[serde(default = "default_exchange_suffix")]
    pub exchange_suffix: String,

    #[serde(default = "default_focus_tickers")]
    pub focus: Vec<String>,

    /// Constituent CSV for benchmarking. Built-in list when unset.
    #[serde(default)]
    pub benchmark_csv: Option<PathBuf>,
}

/// Per-metric column toggles. Display only, scoring ignores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct DisplayOptions {
    #[serde(default = "default_true")]
    pub pe: bool,
    #[serde(default = "default_true")]
    pub pb: bool,
    #[serde(default = "default_true")]
    pub roe: bool,
    #[serde(default = "default_true")]
    pub debt_equity: bool,
    #[serde(default = "default_true")]
    pub ps: bool,
    #[serde(default = "default_true")]
    pub trend: bool,
}

// ── Pool size ────────────────────────────────────────────────────────────────

/// How many top-market-cap tickers feed the benchmark aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PoolSize {
    #[default]
    Top100,
    Top150,
    Top200,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("pool size must be one of 100, 150 or 200 (got {0})")]
pub struct PoolSizeError(pub String);

impl PoolSize {
    pub fn count(self) -> usize {
        match self {
            PoolSize::Top100 => 100,
            PoolSize::Top150 => 150,
            PoolSize::Top200 => 200,
        }
    }
}

impl TryFrom<u32> for PoolSize {
    type Error = PoolSizeError;

    fn try_from(n: u32) -> Result<Self, Self::Error> {
        match n {
            100 => Ok(PoolSize::Top100),
            150 => Ok(PoolSize::Top150),
            200 => Ok(PoolSize::Top200),
            other => Err(PoolSizeError(other.to_string())),
        }
    }
}

impl From<PoolSize> for u32 {
    fn from(p: PoolSize) -> u32 {
        p.count() as u32
    }
}

impl FromStr for PoolSize {
    type Err = PoolSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u32 = s.trim().parse().map_err(|_| PoolSizeError(s.to_string()))?;
        PoolSize::try_from(n)
    }
}

impl fmt::Display for PoolSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.count())
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_chart_url() -> String {
    "https://query1.finance.yahoo.com/v8/finance/chart".to_string()
}
fn default_summary_url() -> String {
    "https://query2.finance.yahoo.com/v10/finance/quoteSummary".to_string()
}
fn default_cookie_url() -> String {
    "https://fc.yahoo.com".to_string()
}
fn default_crumb_url() -> String {
    "https://query2.finance.yahoo.com/v1/test/getcrumb".to_string()
}
fn default_history_range() -> String {
    "2y".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_request_delay_ms() -> u64 {
    250
}
fn default_jitter_ms() -> u64 {
    250
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) asx-dashboard/0.1".to_string()
}
fn default_ttl_secs() -> u64 {
    3600
}
fn default_true() -> bool {
    true
}
fn default_concurrency() -> usize {
    4
}
fn default_exchange_suffix() -> String {
    ".AX".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            chart_url: default_chart_url(),
            summary_url: default_summary_url(),
            cookie_url: default_cookie_url(),
            crumb_url: default_crumb_url(),
            use_crumb: true,
            history_range: default_history_range(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            jitter_ms: default_jitter_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            pool_size: PoolSize::default(),
            dynamic_benchmarks: true,
        }
    }
}

impl Default for UniverseConfig {
    fn default() -> Self {
        Self {
            exchange_suffix: default_exchange_suffix(),
            focus: default_focus_tickers(),
            benchmark_csv: None,
        }
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            pe: true,
            pb: true,
            roe: true,
            debt_equity: true,
            ps: true,
            trend: true,
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();

        let cfg = config::Config::builder()
            .add_source(
                config::File::with_name("config/default")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::File::with_name("config/local")
                    .required(false)
                    .format(config::FileFormat::Toml),
            )
            .add_source(
                config::Environment::with_prefix("ASX")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("universe.focus"),
            )
            .build()
            .context("Failed to read configuration sources")?;

        cfg.try_deserialize().context("Invalid configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_size_accepts_only_enumerated_values() {
        assert_eq!("150".parse::<PoolSize>(), Ok(PoolSize::Top150));
        assert_eq!(PoolSize::try_from(200), Ok(PoolSize::Top200));
        assert!("120".parse::<PoolSize>().is_err());
        assert!("lots".parse::<PoolSize>().is_err());
        assert_eq!(PoolSize::default().count(), 100);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let cfg: AppConfig = config::Config::builder()
            .add_source(config::File::from_str(
                "[pipeline]\npool_size = 200\n\n[display]\nps = false\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(cfg.pipeline.pool_size, PoolSize::Top200);
        assert_eq!(cfg.pipeline.concurrency, 4);
        assert!(!cfg.display.ps);
        assert!(cfg.display.pe);
        assert_eq!(cfg.universe.exchange_suffix, ".AX");
        assert_eq!(cfg.universe.focus.len(), 50);
        assert_eq!(cfg.cache.ttl_secs, 3600);
    }

    #[test]
    fn test_invalid_pool_size_is_rejected() {
        let result: Result<AppConfig, _> = config::Config::builder()
            .add_source(config::File::from_str(
                "[pipeline]\npool_size = 175\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize();
        assert!(result.is_err());
    }
}
