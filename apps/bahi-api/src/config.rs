//! # Application Configuration
//!
//! Loaded once at startup and read-only afterwards.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`BAHI_*`)
//! 2. Config file (`BAHI_CONFIG`, else `config.toml` in the platform config dir)
//! 3. Defaults (this file)
//!
//! ```toml
//! tenant_id = "my-firm"
//! firm_name = "Sharma Traders"
//! firm_state_code = "27"
//! bill_prefix = "ST/24-25/"
//! bill_number_width = 5
//! database_path = "/var/lib/bahi/bahi.db"
//! bind_addr = "0.0.0.0:8080"
//! draft_idle_minutes = 240
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use bahi_core::totals::{CurrencyFormat, Grouping};
use bahi_core::types::BillNumberFormat;
use bahi_core::DEFAULT_TENANT_ID;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Tenant every request runs as.
    pub tenant_id: String,

    /// Firm name (printed on invoices)
    pub firm_name: String,

    /// Two-digit GST state code of the firm. Used to suggest intra/inter-state.
    pub firm_state_code: Option<String>,

    pub currency_symbol: String,

    pub bill_prefix: String,

    /// Minimum digits of the bill number; shorter numbers are zero-padded.
    pub bill_number_width: usize,

    /// SQLite file. `None` uses the platform data dir.
    pub database_path: Option<PathBuf>,

    pub bind_addr: String,

    /// GST switch seeded for a tenant that has no settings yet.
    pub default_gst_enabled: bool,

    /// Drafts untouched for this long are dropped when a new one is opened.
    pub draft_idle_minutes: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        let format = BillNumberFormat::default();
        AppConfig {
            tenant_id: DEFAULT_TENANT_ID.to_string(),
            firm_name: "Bahi Dev Firm".to_string(),
            firm_state_code: None,
            currency_symbol: "₹".to_string(),
            bill_prefix: format.prefix,
            bill_number_width: format.width,
            database_path: None,
            bind_addr: "127.0.0.1:8080".to_string(),
            default_gst_enabled: true,
            draft_idle_minutes: 8 * 60,
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {0}")]
    InvalidValue(String),

    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

impl AppConfig {
    /// Loads defaults, the config file if present, then `BAHI_*` overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!(path = %path.display(), "No config file, using defaults");
                AppConfig::default()
            }
            None => AppConfig::default(),
        };

        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        info!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Applies `BAHI_*` variables read through `lookup`.
    ///
    /// ## Variables
    /// - `BAHI_TENANT_ID`, `BAHI_FIRM_NAME`, `BAHI_FIRM_STATE_CODE`
    /// - `BAHI_CURRENCY_SYMBOL`
    /// - `BAHI_BILL_PREFIX`, `BAHI_BILL_NUMBER_WIDTH`
    /// - `BAHI_DB_PATH`, `BAHI_BIND_ADDR`
    /// - `BAHI_GST_ENABLED` (`true`/`false`/`1`/`0`)
    /// - `BAHI_DRAFT_IDLE_MINUTES`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("BAHI_TENANT_ID") {
            self.tenant_id = v;
        }
        if let Some(v) = lookup("BAHI_FIRM_NAME") {
            self.firm_name = v;
        }
        if let Some(v) = lookup("BAHI_FIRM_STATE_CODE") {
            self.firm_state_code = Some(v);
        }
        if let Some(v) = lookup("BAHI_CURRENCY_SYMBOL") {
            self.currency_symbol = v;
        }
        if let Some(v) = lookup("BAHI_BILL_PREFIX") {
            self.bill_prefix = v;
        }
        if let Some(v) = lookup("BAHI_BILL_NUMBER_WIDTH") {
            self.bill_number_width = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BAHI_BILL_NUMBER_WIDTH".to_string()))?;
        }
        if let Some(v) = lookup("BAHI_DB_PATH") {
            self.database_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("BAHI_BIND_ADDR") {
            self.bind_addr = v;
        }
        if let Some(v) = lookup("BAHI_GST_ENABLED") {
            self.default_gst_enabled = match v.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => return Err(ConfigError::InvalidValue("BAHI_GST_ENABLED".to_string())),
            };
        }
        if let Some(v) = lookup("BAHI_DRAFT_IDLE_MINUTES") {
            self.draft_idle_minutes = v
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BAHI_DRAFT_IDLE_MINUTES".to_string()))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue("tenant_id".to_string()));
        }
        if self.bill_number_width == 0 || self.bill_number_width > 12 {
            return Err(ConfigError::InvalidValue("bill_number_width".to_string()));
        }
        if let Some(code) = &self.firm_state_code {
            let code = code.trim();
            if code.len() != 2 || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::InvalidValue("firm_state_code".to_string()));
            }
        }
        if self.bind_addr.trim().is_empty() {
            return Err(ConfigError::InvalidValue("bind_addr".to_string()));
        }
        if self.draft_idle_minutes == 0 {
            return Err(ConfigError::InvalidValue("draft_idle_minutes".to_string()));
        }
        Ok(())
    }

    pub fn bill_format(&self) -> BillNumberFormat {
        BillNumberFormat::new(self.bill_prefix.clone(), self.bill_number_width)
    }

    pub fn draft_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.draft_idle_minutes.saturating_mul(60))
    }

    pub fn currency(&self) -> CurrencyFormat {
        CurrencyFormat::new(self.currency_symbol.clone(), Grouping::Indian)
    }

    /// The configured database file, or `bahi.db` in the platform data dir.
    ///
    /// ## Platform-Specific Paths
    /// - **macOS**: `~/Library/Application Support/in.bahi.bahi/bahi.db`
    /// - **Windows**: `%APPDATA%\bahi\bahi\data\bahi.db`
    /// - **Linux**: `~/.local/share/bahi/bahi.db`
    pub fn resolve_database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }
        let dirs = project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir).map_err(|source| ConfigError::Read {
            path: data_dir.to_path_buf(),
            source,
        })?;
        Ok(data_dir.join("bahi.db"))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("in", "bahi", "bahi")
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("BAHI_CONFIG") {
        return Some(PathBuf::from(path));
    }
    project_dirs().map(|dirs| dirs.config_dir().join("config.toml"))
}
