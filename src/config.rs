use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "jeju_places";
const ENV_PREFIX: &str = "JEJU";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Runtime settings: defaults < `jeju_places.toml` < `JEJU_*` environment.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub api_key: Option<String>,
    pub locale: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    pub page_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub accept_invalid_certs: bool,
    pub user_agent: String,
    pub data_path: PathBuf,
    pub csv_path: PathBuf,
    pub db_path: PathBuf,
    pub collection: String,
    pub batch_size: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            api_base_url: "https://api.visitjeju.net/vsjApi/contents/searchList".to_string(),
            api_key: None,
            locale: "kr".to_string(),
            max_retries: 3,
            retry_delay_ms: 2000,
            page_delay_ms: 1000,
            request_timeout_secs: 10,
            accept_invalid_certs: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            data_path: PathBuf::from("visitjeju_data_all.json"),
            csv_path: PathBuf::from("visitjeju_data_all.csv"),
            db_path: PathBuf::from("data/places.sqlite"),
            collection: "spots".to_string(),
            batch_size: crate::uploader::DEFAULT_BATCH_SIZE,
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Failed to load settings")
    }

    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .with_context(|| format!("{}_API_KEY must be set to fetch from the source API", ENV_PREFIX))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

// Hand-written so the API key never reaches the logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("api_base_url", &self.api_base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("locale", &self.locale)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("data_path", &self.data_path)
            .field("csv_path", &self.csv_path)
            .field("db_path", &self.db_path)
            .field("collection", &self.collection)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_masks_api_key() {
        let settings = Settings {
            api_key: Some("bfadd3cade95484d".to_string()),
            ..Default::default()
        };
        let shown = format!("{:?}", settings);
        assert!(!shown.contains("bfadd3cade95484d"));
        assert!(shown.contains("***"));
    }

    #[test]
    fn api_key_is_required_for_fetching() {
        assert!(Settings::default().require_api_key().is_err());
        let blank = Settings {
            api_key: Some("  ".to_string()),
            ..Default::default()
        };
        assert!(blank.require_api_key().is_err());
    }

    #[test]
    fn defaults_from_empty_sources() {
        let settings: Settings = Config::builder()
            .build()
            .and_then(|c| c.try_deserialize())
            .unwrap();
        assert_eq!(settings.batch_size, 500);
        assert_eq!(settings.collection, "spots");
        assert_eq!(settings.retry_delay(), Duration::from_secs(2));
        assert_eq!(settings.page_delay(), Duration::from_secs(1));
    }
}
