//! Runtime configuration: optional TOML file, then environment overrides.
//!
//! ```toml
//! environment = "production"
//! base_url = "https://api.ifast.com"
//! timeout_secs = 30
//! db_path = "ifast.db"
//! token_dir = "/home/me/.local/share"
//! keychain_service = "com.iFast.AuthAPI.TokenStore"
//! keychain_account = "default"
//! ```
//!
//! Every key is optional. `IFAST_ENV`, `IFAST_BASE_URL`, `IFAST_TIMEOUT_SECS`,
//! `IFAST_DB` and `IFAST_TOKEN_DIR` override the file.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::token_store::{FileTokenStore, DEFAULT_ACCOUNT, DEFAULT_SERVICE};

pub const DEVELOPMENT_BASE_URL: &str = "http://localhost:8080";
pub const PRODUCTION_BASE_URL: &str = "https://api.ifast.com";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DB_PATH: &str = "ifast.db";

/// Environment variable naming a config file to load when none is passed.
pub const CONFIG_PATH_VAR: &str = "IFAST_CONFIG";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Which backend the defaults point at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Environment::Development => DEVELOPMENT_BASE_URL,
            Environment::Production => PRODUCTION_BASE_URL,
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "environment",
                value: s.to_string(),
            }),
        }
    }
}

#[derive(Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    environment: Option<Environment>,
    base_url: Option<String>,
    timeout_secs: Option<u64>,
    db_path: Option<PathBuf>,
    token_dir: Option<PathBuf>,
    keychain_service: Option<String>,
    keychain_account: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub environment: Environment,
    pub base_url: String,
    pub request_timeout: Duration,
    pub db_path: PathBuf,
    /// Root directory for stored credentials. `None` uses the platform data directory.
    pub token_dir: Option<PathBuf>,
    pub keychain_service: String,
    pub keychain_account: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl Config {
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            base_url: environment.default_base_url().to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            token_dir: None,
            keychain_service: DEFAULT_SERVICE.to_string(),
            keychain_account: DEFAULT_ACCOUNT.to_string(),
        }
    }

    /// Loads `path` (or the file named by `IFAST_CONFIG`) if any, then applies
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));
        let mut config = match path {
            Some(path) => {
                let contents =
                    std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
                        path: path.clone(),
                        source,
                    })?;
                tracing::debug!("Loaded config from {}", path.display());
                Self::from_toml_str(&contents)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: FileConfig = toml::from_str(contents)?;
        let mut config = Self::for_environment(file.environment.unwrap_or_default());
        if let Some(base_url) = file.base_url {
            config.base_url = base_url;
        }
        if let Some(secs) = file.timeout_secs {
            config.request_timeout = timeout_from_secs(secs)?;
        }
        if let Some(db_path) = file.db_path {
            config.db_path = db_path;
        }
        config.token_dir = file.token_dir;
        if let Some(service) = file.keychain_service {
            config.keychain_service = service;
        }
        if let Some(account) = file.keychain_account {
            config.keychain_account = account;
        }
        Ok(config)
    }

    /// Applies `IFAST_*` overrides read through `lookup`.
    ///
    /// Changing the environment without also setting a base URL switches the
    /// base URL to that environment's default.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(env) = lookup("IFAST_ENV") {
            let env: Environment = env.parse()?;
            if self.base_url == self.environment.default_base_url() {
                self.base_url = env.default_base_url().to_string();
            }
            self.environment = env;
        }
        if let Some(url) = lookup("IFAST_BASE_URL") {
            self.base_url = url;
        }
        if let Some(raw) = lookup("IFAST_TIMEOUT_SECS") {
            let secs = raw.trim().parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: "IFAST_TIMEOUT_SECS",
                value: raw.clone(),
            })?;
            self.request_timeout = timeout_from_secs(secs)?;
        }
        if let Some(db) = lookup("IFAST_DB") {
            self.db_path = PathBuf::from(db);
        }
        if let Some(dir) = lookup("IFAST_TOKEN_DIR") {
            self.token_dir = Some(PathBuf::from(dir));
        }
        Ok(())
    }

    /// Builds the credential store this configuration points at.
    pub fn token_store(&self) -> Result<FileTokenStore, ifast_api::TokenStoreError> {
        match &self.token_dir {
            Some(dir) => Ok(FileTokenStore::new(
                dir,
                &self.keychain_service,
                &self.keychain_account,
            )),
            None => FileTokenStore::in_default_location(
                &self.keychain_service,
                &self.keychain_account,
            ),
        }
    }
}

fn timeout_from_secs(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidValue {
            key: "timeout_secs",
            value: secs.to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
