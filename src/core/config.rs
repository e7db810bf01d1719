use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use std::{fs, path::PathBuf};
use thiserror::Error;
use tracing::debug;

use super::currency::{CurrencyCode, CurrencyPair, RateTable};

pub const DEFAULT_FEED_URL: &str =
    "https://cdn.jsdelivr.net/gh/fawazahmed0/currency-api@1/latest/currencies";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TELEGRAM_TOKEN environment variable is not set")]
    MissingToken,

    #[error("Invalid rate table: {0}")]
    InvalidTable(String),

    #[error("Request timeout must be at least one second")]
    InvalidTimeout,

    #[error("Could not determine project directories")]
    NoProjectDirs,

    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct FeedConfig {
    #[serde(default = "default_feed_url")]
    pub base_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Default for FeedConfig {
    fn default() -> Self {
        FeedConfig {
            base_url: default_feed_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl FeedConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub feed: FeedConfig,
    pub pairs: Option<Vec<CurrencyPair>>,
    pub labels: Option<HashMap<CurrencyCode, String>>,
}

impl AppConfig {
    /// Loads the config from the default location, or defaults when no file exists there.
    pub fn load() -> Result<Self, ConfigError> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let proj_dirs = ProjectDirs::from("org", "kursbot", "kursbot").ok_or(ConfigError::NoProjectDirs)?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = serde_yaml::from_str(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.feed.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }

    /// The validated rate table, with defaults for whichever half is not configured.
    pub fn rate_table(&self) -> Result<RateTable, ConfigError> {
        RateTable::new(
            self.pairs.clone().unwrap_or_else(RateTable::default_pairs),
            self.labels.clone().unwrap_or_else(RateTable::default_labels),
        )
    }
}

/// Secrets read from the process environment.
#[derive(Deserialize, Clone)]
pub struct Secrets {
    pub telegram_token: String,
}

impl std::fmt::Debug for Secrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secrets")
            .field("telegram_token", &"<redacted>")
            .finish()
    }
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let secrets: Secrets = envy::from_iter(vars).map_err(|_| ConfigError::MissingToken)?;
        if secrets.telegram_token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        Ok(secrets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = serde_yaml::from_str("{}").expect("Failed to deserialize");
        assert_eq!(config.feed.base_url, DEFAULT_FEED_URL);
        assert_eq!(config.feed.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.rate_table().unwrap(), RateTable::default());
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
feed:
  base_url: "http://example.com/currencies"
  request_timeout_secs: 3
pairs:
  - [usd, rub]
  - [eur, gel]
labels:
  usd: "Dollar"
  rub: "Ruble"
  eur: "Euro"
  gel: "Lari"
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.feed.base_url, "http://example.com/currencies");
        assert_eq!(config.feed.request_timeout_secs, 3);

        let table = config.rate_table().unwrap();
        assert_eq!(table.pairs().len(), 2);
        assert_eq!(table.pairs()[1].to_string(), "eur/gel");
        assert_eq!(table.label(&"gel".parse().unwrap()), "Lari");
    }

    #[test]
    fn test_feed_section_without_base_url() {
        let yaml_str = r#"
feed:
  request_timeout_secs: 3
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.feed.base_url, DEFAULT_FEED_URL);
        assert_eq!(config.feed.request_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_zero_timeout_is_rejected_on_load() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "feed:\n  request_timeout_secs: 0\n").unwrap();

        let result = AppConfig::load_from_path(file.path());
        assert!(matches!(result, Err(ConfigError::InvalidTimeout)));
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_pairs_without_matching_labels_are_rejected() {
        let yaml_str = r#"
pairs:
  - [usd, gel]
"#;
        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert!(matches!(
            config.rate_table(),
            Err(ConfigError::InvalidTable(_))
        ));
    }

    #[test]
    fn test_load_from_path_reports_parse_errors() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "pairs: [[USD, rub]]").unwrap();

        let result = AppConfig::load_from_path(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_load_from_missing_path() {
        let result = AppConfig::load_from_path("/nonexistent/kursbot/config.yaml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_secrets_from_env() {
        let vars = vec![("TELEGRAM_TOKEN".to_string(), "123:abc".to_string())];
        let secrets = Secrets::from_vars(vars).unwrap();
        assert_eq!(secrets.telegram_token, "123:abc");
        assert!(!format!("{secrets:?}").contains("123:abc"));
    }

    #[test]
    fn test_missing_token_is_config_error() {
        let result = Secrets::from_vars(Vec::new());
        assert!(matches!(result, Err(ConfigError::MissingToken)));

        let blank = vec![("TELEGRAM_TOKEN".to_string(), "  ".to_string())];
        assert!(matches!(
            Secrets::from_vars(blank),
            Err(ConfigError::MissingToken)
        ));
    }
}
