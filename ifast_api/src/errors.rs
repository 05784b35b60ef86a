//! Error types for the API client.

use crate::token::TokenStoreError;

/// Errors that can occur when making API requests.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The base URL, path and query could not be composed into a valid URL.
    #[error("Invalid URL")]
    InvalidUrl,
    /// The API returned a non-success status other than 401, with a body snippet.
    #[error("Request failed with status {status}")]
    HttpStatus { status: u16, body: String },
    /// A 2xx response body could not be decoded into the expected shape.
    #[error("Failed to decode response: {0}")]
    Decoding(String),
    /// The request never produced an HTTP response (DNS, TLS, connection, timeout).
    #[error("Network failure: {0}")]
    Network(String),
    /// The API answered 401.
    #[error("Unauthorized")]
    Unauthorized,
    /// Reading or writing the credential store failed.
    #[error("Credential store error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

impl Error {
    /// Returns the HTTP status code carried by this error, if any.
    ///
    /// `Unauthorized` reports 401 so callers can map status codes uniformly.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }
}
