//! Error types for the library layer.

use std::fmt;

use ifast_api::TokenStoreError;

use crate::config::ConfigError;
use crate::db::DbError;

/// Errors produced by the library layer, wrapping upstream API errors
/// and adding storage, configuration, and input validation failures.
#[derive(Debug)]
pub enum IfastError {
    /// An error from the underlying API client.
    Api(ifast_api::Error),
    /// The local record database failed.
    Db(DbError),
    /// The credential store failed outside of an API call.
    TokenStore(TokenStoreError),
    /// Configuration could not be loaded.
    Config(ConfigError),
    /// User-provided input failed validation.
    InvalidInput(String),
}

impl fmt::Display for IfastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api(e) => write!(f, "API error: {}", e),
            Self::Db(e) => write!(f, "Database error: {}", e),
            Self::TokenStore(e) => write!(f, "Credential store error: {}", e),
            Self::Config(e) => write!(f, "Configuration error: {}", e),
            Self::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
        }
    }
}

impl std::error::Error for IfastError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Api(e) => Some(e),
            Self::Db(e) => Some(e),
            Self::TokenStore(e) => Some(e),
            Self::Config(e) => Some(e),
            Self::InvalidInput(_) => None,
        }
    }
}

impl From<ifast_api::Error> for IfastError {
    fn from(e: ifast_api::Error) -> Self {
        Self::Api(e)
    }
}

impl From<DbError> for IfastError {
    fn from(e: DbError) -> Self {
        Self::Db(e)
    }
}

impl From<TokenStoreError> for IfastError {
    fn from(e: TokenStoreError) -> Self {
        Self::TokenStore(e)
    }
}

impl From<ConfigError> for IfastError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}
