use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub scraper: ScraperConfig,
    #[serde(default)]
    pub indices: IndicesConfig,
    #[serde(default)]
    pub quotes: QuoteConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// HTTP settings shared by the page scraper and the quote client
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScraperConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

/// The two index constituent pages, fetched in this order
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IndicesConfig {
    #[serde(default = "default_sp500")]
    pub sp500: IndexSource,

    #[serde(default = "default_midcap")]
    pub midcap: IndexSource,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct IndexSource {
    pub name: String,
    pub url: String,
}

/// Yahoo Finance quote provider
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteConfig {
    #[serde(default = "default_quote_base_url")]
    pub base_url: String,

    #[serde(default = "default_cookie_url")]
    pub cookie_url: String,

    #[serde(default = "default_crumb_url")]
    pub crumb_url: String,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default = "default_batch_delay_ms")]
    pub batch_delay_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_path")]
    pub path: PathBuf,
}

// ── Defaults ─────────────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 {
    30
}
fn default_max_retries() -> usize {
    2
}
fn default_retry_base_ms() -> u64 {
    500
}
fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) index-export/0.1"
        .to_string()
}
fn default_sp500() -> IndexSource {
    IndexSource {
        name: "S&P 500".to_string(),
        url: "https://en.wikipedia.org/wiki/List_of_S%26P_500_companies".to_string(),
    }
}
fn default_midcap() -> IndexSource {
    IndexSource {
        name: "S&P MidCap 400".to_string(),
        url: "https://en.wikipedia.org/wiki/List_of_S%26P_400_companies".to_string(),
    }
}
fn default_quote_base_url() -> String {
    "https://query1.finance.yahoo.com".to_string()
}
fn default_cookie_url() -> String {
    "https://fc.yahoo.com".to_string()
}
fn default_crumb_url() -> String {
    "https://query2.finance.yahoo.com/v1/test/getcrumb".to_string()
}
fn default_batch_size() -> usize {
    50
}
fn default_batch_delay_ms() -> u64 {
    250
}
fn default_output_path() -> PathBuf {
    PathBuf::from("index_constituents.csv")
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for IndicesConfig {
    fn default() -> Self {
        Self {
            sp500: default_sp500(),
            midcap: default_midcap(),
        }
    }
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_quote_base_url(),
            cookie_url: default_cookie_url(),
            crumb_url: default_crumb_url(),
            batch_size: default_batch_size(),
            batch_delay_ms: default_batch_delay_ms(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
        }
    }
}

// ── Loader ───────────────────────────────────────────────────────────────────

impl AppConfig {
    /// Load configuration from file + environment overrides
    pub fn load() -> Result<Self> {
        dotenv::dotenv().ok();
        Self::load_with(environment())
    }

    fn load_with(env: config::Environment) -> Result<Self> {
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
            .add_source(env)
            .build()
            .context("Failed to read configuration")?;

        cfg.try_deserialize().context("Invalid configuration")
    }
}

/// `IDX_<SECTION>__<KEY>`, e.g. `IDX_QUOTES__BATCH_SIZE=25`
fn environment() -> config::Environment {
    config::Environment::with_prefix("IDX")
        .prefix_separator("_")
        .separator("__")
}
