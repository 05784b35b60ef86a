//! Login, token refresh, logout, and the refresh-once retry policy.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::{
    client::Client,
    request::ApiRequest,
    token::{TokenPair, TokenStore},
    types::LoginRequest,
    Error,
};

pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REFRESH_PATH: &str = "/api/auth/refresh";
pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Separator between the access and refresh parts of the login response.
const TOKEN_DELIMITER: char = '|';

/// Authentication flows layered on top of [`Client`].
///
/// [`AuthService::call`] is the entry point every protected endpoint goes
/// through: it performs the request once, and on `401` refreshes the access
/// token and re-issues the request exactly one more time.
///
/// Concurrent calls that both hit `401` will each refresh independently; the
/// last one to finish wins the stored pair.
#[derive(Clone)]
pub struct AuthService {
    client: Client,
}

impl AuthService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    fn tokens(&self) -> &Arc<dyn TokenStore> {
        self.client.token_store()
    }

    /// Whether a token pair is currently stored.
    pub fn has_tokens(&self) -> Result<bool, Error> {
        Ok(self.tokens().load()?.is_some())
    }

    /// Exchanges credentials for a token pair and stores it.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, Error> {
        let body = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let req = ApiRequest::post(LOGIN_PATH).with_json(&body)?.public();
        let raw = self.client.perform_text(&req).await?;
        let tokens = split_token_string(&raw)?;
        self.tokens().save(&tokens)?;
        tracing::info!("Logged in as {}", username);
        Ok(tokens)
    }

    /// Swaps the stored refresh token for a new access token.
    ///
    /// Does nothing when no pair is stored; the caller's next protected request
    /// then surfaces the server's 401.
    pub async fn refresh(&self) -> Result<(), Error> {
        let Some(current) = self.tokens().load()? else {
            tracing::debug!("No stored tokens, skipping refresh");
            return Ok(());
        };
        let req = ApiRequest::post(REFRESH_PATH)
            .with_query("refreshToken", current.refresh_token.clone())
            .public();
        let access = self.client.perform_text(&req).await?;
        let access = trim_token(&access);
        if access.is_empty() {
            return Err(Error::Decoding("refresh returned an empty access token".to_string()));
        }
        self.tokens()
            .save(&TokenPair::new(access, current.refresh_token))?;
        tracing::debug!("Access token refreshed");
        Ok(())
    }

    /// Ends the server session and always clears the local token pair.
    ///
    /// A failing remote call is returned only after the local pair is gone.
    pub async fn logout(&self) -> Result<(), Error> {
        let remote = self.call_text(&ApiRequest::post(LOGOUT_PATH)).await;
        if let Err(ref e) = remote {
            tracing::warn!("Remote logout failed, clearing local session anyway: {}", e);
        }
        self.tokens().delete()?;
        remote.map(|_| ())
    }

    /// Performs `req`, refreshing and retrying once on `401`, and decodes JSON.
    pub async fn call<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T, Error> {
        match self.client.perform::<T>(req).await {
            Err(Error::Unauthorized) => {
                tracing::warn!("{} unauthorized, refreshing and retrying", req.path);
                self.refresh().await?;
                self.client.perform::<T>(req).await
            }
            other => other,
        }
    }

    /// Like [`AuthService::call`], returning the raw body text.
    pub async fn call_text(&self, req: &ApiRequest) -> Result<String, Error> {
        match self.client.perform_text(req).await {
            Err(Error::Unauthorized) => {
                tracing::warn!("{} unauthorized, refreshing and retrying", req.path);
                self.refresh().await?;
                self.client.perform_text(req).await
            }
            other => other,
        }
    }
}

fn trim_token(raw: &str) -> &str {
    raw.trim().trim_matches('"').trim()
}

/// Splits the login response `access|refresh` into a pair.
fn split_token_string(raw: &str) -> Result<TokenPair, Error> {
    let parts: Vec<&str> = trim_token(raw).split(TOKEN_DELIMITER).collect();
    match parts.as_slice() {
        [access, refresh] if !access.is_empty() && !refresh.is_empty() => {
            Ok(TokenPair::new(*access, *refresh))
        }
        _ => {
            tracing::error!("Login response is not an access|refresh pair");
            Err(Error::Decoding(
                "login response is not an access|refresh pair".to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_and_quoted_tokens() {
        assert_eq!(
            split_token_string("abc|def").unwrap(),
            TokenPair::new("abc", "def")
        );
        assert_eq!(
            split_token_string("\"abc|def\"\n").unwrap(),
            TokenPair::new("abc", "def")
        );
    }

    #[test]
    fn rejects_malformed_token_strings() {
        for raw in ["", "abc", "abc|", "|def", "a|b|c"] {
            assert!(
                matches!(split_token_string(raw), Err(Error::Decoding(_))),
                "accepted {:?}",
                raw
            );
        }
    }
}
