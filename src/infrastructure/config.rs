//! Configuration infrastructure
//!
//! Contains configuration loading and management for the price tracker.
//! Settings are read from `configs/<env>/config.json`; every section is
//! optional and falls back to the values in [`defaults`].

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::info;

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Snapshot location
    pub data: DataConfig,

    /// HTTP and crawl politeness settings
    pub scraping: ScrapingConfig,

    /// Result limits
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the snapshot file
    pub dir: PathBuf,

    /// Snapshot file name inside `dir`
    pub file: String,
}

impl DataConfig {
    /// Full path of the product snapshot
    pub fn snapshot_path(&self) -> PathBuf {
        self.dir.join(&self.file)
    }
}

/// Crawling specific configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScrapingConfig {
    /// User agent sent with every request
    pub user_agent: String,

    /// Per-request transport timeout in seconds
    #[serde(rename = "timeout")]
    pub timeout_seconds: u64,

    /// Extra attempts for transport failures and 5xx responses
    pub retries: u32,

    /// Link depth followed from the start URL
    pub max_depth: u32,

    /// Requests in flight per domain glob
    pub parallelism: usize,

    /// Minimum delay between requests to the same domain glob
    pub request_delay_ms: u64,

    /// Domain glob the politeness limit applies to
    pub domain_glob: String,

    /// Hosts the crawler may visit
    pub allowed_domains: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApiConfig {
    /// Search result cap used when the caller does not supply one
    pub max_results: usize,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Log directory, defaults to the platform data directory
    pub directory: Option<PathBuf>,

    /// Log file name inside the log directory
    pub file_name: String,

    /// Module-specific log level filters (e.g., "reqwest": "warn")
    pub module_filters: HashMap<String, String>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(defaults::DATA_DIR),
            file: defaults::DATA_FILE.to_string(),
        }
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::USER_AGENT.to_string(),
            timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            retries: defaults::RETRIES,
            max_depth: defaults::MAX_DEPTH,
            parallelism: defaults::PARALLELISM,
            request_delay_ms: defaults::REQUEST_DELAY_MS,
            domain_glob: rakuten::DOMAIN_GLOB.to_string(),
            allowed_domains: rakuten::ALLOWED_DOMAINS
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            max_results: defaults::MAX_RESULTS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: None,
            file_name: defaults::LOG_FILE_NAME.to_string(),
            module_filters: {
                let mut filters = HashMap::new();
                filters.insert("reqwest".to_string(), "warn".to_string());
                filters.insert("hyper".to_string(), "warn".to_string());
                filters.insert("h2".to_string(), "warn".to_string());
                filters.insert("html5ever".to_string(), "warn".to_string());
                filters.insert("selectors".to_string(), "warn".to_string());
                filters
            },
        }
    }
}

/// Configuration manager for loading and saving settings
pub struct ConfigManager {
    pub config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for `configs/<env>/config.json`, `env` defaults to "dev"
    pub fn for_env(env: &str) -> Self {
        let env = if env.is_empty() { defaults::ENVIRONMENT } else { env };
        Self {
            config_path: Path::new(defaults::CONFIG_ROOT)
                .join(env)
                .join(defaults::CONFIG_FILE),
        }
    }

    /// Manager for an explicit configuration file
    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    /// Load configuration from file, using defaults if it doesn't exist
    pub async fn load_config(&self) -> Result<AppConfig> {
        if !fs::try_exists(&self.config_path).await.unwrap_or(false) {
            info!(
                "Configuration file not found, using defaults: {:?}",
                self.config_path
            );
            return Ok(AppConfig::default());
        }

        let content = fs::read_to_string(&self.config_path)
            .await
            .with_context(|| format!("Failed to read configuration file {:?}", self.config_path))?;

        let config = serde_json::from_str::<AppConfig>(&content)
            .with_context(|| format!("Failed to parse configuration file {:?}", self.config_path))?;

        info!("Loaded configuration from: {:?}", self.config_path);
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("Failed to create config directory")?;
        }

        let content =
            serde_json::to_string_pretty(config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, content)
            .await
            .context("Failed to write configuration file")?;

        info!("Saved configuration to: {:?}", self.config_path);
        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

/// Rakuten site family constants
pub mod rakuten {
    /// Site key used by the scraper registry
    pub const SITE_KEY: &str = "rakuten";

    /// Currency every Rakuten JP price is reported in
    pub const CURRENCY: &str = "JPY";

    /// Hosts the Rakuten crawler may visit
    pub const ALLOWED_DOMAINS: &[&str] = &[
        "www.rakuten.co.jp",
        "item.rakuten.co.jp",
        "search.rakuten.co.jp",
        "books.rakuten.co.jp",
    ];

    /// Domain glob the politeness limit applies to
    pub const DOMAIN_GLOB: &str = "*rakuten.*";

    /// Search results page, the keyword is appended as a path segment
    pub const SEARCH_BASE_URL: &str = "https://search.rakuten.co.jp/search/mall/";
}

/// Default configuration values
pub mod defaults {
    /// Default environment name
    pub const ENVIRONMENT: &str = "dev";

    /// Directory holding per-environment configuration
    pub const CONFIG_ROOT: &str = "configs";

    /// Configuration file name
    pub const CONFIG_FILE: &str = "config.json";

    /// Default snapshot directory
    pub const DATA_DIR: &str = "./data";

    /// Default snapshot file name
    pub const DATA_FILE: &str = "products.json";

    /// Default user agent (desktop Chrome)
    pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36";

    /// Default request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// Default extra attempts for failed requests
    pub const RETRIES: u32 = 0;

    /// Default crawl depth
    pub const MAX_DEPTH: u32 = 2;

    /// Default requests in flight per domain glob
    pub const PARALLELISM: usize = 2;

    /// Default delay between requests in milliseconds
    pub const REQUEST_DELAY_MS: u64 = 2000;

    /// Default retry backoff in milliseconds
    pub const RETRY_DELAY_MS: u64 = 1000;

    /// Default search result cap
    pub const MAX_RESULTS: usize = 10;

    /// Default log level
    pub const LOG_LEVEL: &str = "info";

    /// Default JSON format setting
    pub const LOG_JSON_FORMAT: bool = false;

    /// Default console output setting
    pub const LOG_CONSOLE_OUTPUT: bool = true;

    /// Default file output setting
    pub const LOG_FILE_OUTPUT: bool = false;

    /// Default log file name
    pub const LOG_FILE_NAME: &str = "price-tracker.log";
}
