use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EastmoneyProviderConfig {
    /// Fund detail pages: `{detail_base_url}/{fund_id}.html`
    #[serde(default = "default_detail_base_url")]
    pub detail_base_url: String,
    /// Fee and dividend pages: `{fee_base_url}/jjfl_{fund_id}.html`
    #[serde(default = "default_fee_base_url")]
    pub fee_base_url: String,
    /// NAV series scripts and the open-fund listing
    #[serde(default = "default_data_base_url")]
    pub data_base_url: String,
}

fn default_detail_base_url() -> String {
    "http://fund.eastmoney.com".to_string()
}

fn default_fee_base_url() -> String {
    "http://fundf10.eastmoney.com".to_string()
}

fn default_data_base_url() -> String {
    "http://fund.eastmoney.com".to_string()
}

impl Default for EastmoneyProviderConfig {
    fn default() -> Self {
        EastmoneyProviderConfig {
            detail_base_url: default_detail_base_url(),
            fee_base_url: default_fee_base_url(),
            data_base_url: default_data_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub eastmoney: EastmoneyProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct HttpConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure. HTTP status errors are not retried.
    #[serde(default = "default_retries")]
    pub retries: usize,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retries() -> usize {
    2
}

fn default_retry_delay_ms() -> u64 {
    500
}

fn default_user_agent() -> String {
    "fundscrape/0.1".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub http: HttpConfig,
    /// Pause between two funds in a batch.
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    pub database_path: Option<String>,
}

fn default_request_delay_ms() -> u64 {
    1000
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            providers: ProvidersConfig::default(),
            http: HttpConfig::default(),
            request_delay_ms: default_request_delay_ms(),
            database_path: None,
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to defaults
    /// when no file has been set up yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fundscrape", "fundscrape")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn database_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.database_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "fundscrape", "fundscrape")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().join("funds.db"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
