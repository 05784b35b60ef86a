//! Token pair and the credential store seam the client reads from.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Access and refresh token bundle used for bearer authentication.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    /// Value of the `Authorization` header for this pair.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Errors from a credential store backend.
#[derive(thiserror::Error, Debug)]
pub enum TokenStoreError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("stored tokens could not be encoded or decoded: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("credential storage unavailable: {0}")]
    Unavailable(String),
}

/// Keyed storage for a single token pair.
///
/// The API client only ever calls [`TokenStore::load`]; saving and deleting
/// belong to the auth flows.
pub trait TokenStore: Send + Sync {
    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError>;
    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError>;
    fn delete(&self) -> Result<(), TokenStoreError>;
}

/// Process-local token store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<TokenPair>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that already holds `tokens`.
    pub fn with_tokens(tokens: TokenPair) -> Self {
        Self {
            slot: Mutex::new(Some(tokens)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, tokens: &TokenPair) -> Result<(), TokenStoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(tokens.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<TokenPair>, TokenStoreError> {
        Ok(self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn delete(&self) -> Result<(), TokenStoreError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
