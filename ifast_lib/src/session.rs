//! Login state for one user of the API.
//!
//! [`SessionManager`] drives the auth flows and keeps a [`SessionState`]
//! snapshot that front ends render: whether the user is signed in, who they
//! are, and the last user-facing error message.

use std::sync::Arc;

use ifast_api::types::UserResponse;
use ifast_api::{AuthService, Client, FastingApi, TokenPair, TokenStore, UserApi};

use crate::config::Config;
use crate::error::IfastError;
use crate::validation;

/// Message left in [`SessionState::last_error`] when an account was created
/// but the automatic login that follows did not succeed.
pub const SIGNUP_LOGIN_REQUIRED: &str = "Account created successfully! Please log in manually.";

const STORE_UNAVAILABLE: &str =
    "Unable to access secure storage. Please check your settings and try again.";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    pub authenticated: bool,
    pub current_user: Option<UserResponse>,
    pub last_error: Option<String>,
}

/// Result of a signup that reached the server successfully.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SignupOutcome {
    /// The account exists and the session is signed in.
    LoggedIn,
    /// The account exists but logging in afterwards failed.
    LoginRequired,
}

pub struct SessionManager {
    auth: AuthService,
    users: UserApi,
    state: SessionState,
}

impl SessionManager {
    pub fn new(auth: AuthService) -> Self {
        let users = UserApi::new(auth.clone());
        Self {
            auth,
            users,
            state: SessionState::default(),
        }
    }

    /// Builds the client stack described by `config`, storing tokens on disk.
    pub fn from_config(config: &Config) -> Result<Self, IfastError> {
        let store: Arc<dyn TokenStore> = Arc::new(config.token_store()?);
        let client = Client::with_timeout(&config.base_url, store, config.request_timeout)?;
        tracing::debug!("Session using {} ({:?})", config.base_url, config.environment);
        Ok(Self::new(AuthService::new(client)))
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn users(&self) -> &UserApi {
        &self.users
    }

    pub fn fasting(&self) -> FastingApi {
        FastingApi::new(self.auth.clone())
    }

    pub fn clear_error(&mut self) {
        self.state.last_error = None;
    }

    /// Signs in from stored tokens, if any. Authenticated only when the
    /// current user can be fetched with them.
    pub async fn restore(&mut self) -> bool {
        match self.auth.has_tokens() {
            Ok(true) => {
                self.refresh_user().await;
                self.state.authenticated = self.state.current_user.is_some();
            }
            Ok(false) => self.state.authenticated = false,
            Err(e) => {
                tracing::warn!("Could not read stored tokens: {}", e);
                self.state.authenticated = false;
            }
        }
        self.state.authenticated
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<(), IfastError> {
        self.state.last_error = None;
        if let Err(e) = self.auth.login(username, password).await {
            let err = IfastError::from(e);
            self.state.last_error = Some(login_error_message(&err));
            return Err(err);
        }
        self.refresh_user().await;
        self.state.authenticated = true;
        Ok(())
    }

    /// Validates input, checks the credential store is writable, registers the
    /// account and then logs in with the same credentials.
    pub async fn signup(
        &mut self,
        first_name: &str,
        last_name: &str,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<SignupOutcome, IfastError> {
        self.state.last_error = None;
        let request = match validation::validate_registration(
            first_name, last_name, email, username, password,
        ) {
            Ok(request) => request,
            Err(err) => {
                self.state.last_error = Some(input_message(&err));
                return Err(err);
            }
        };

        if let Err(e) = self.probe_token_store() {
            tracing::warn!("Credential store check failed: {}", e);
            self.state.last_error = Some(STORE_UNAVAILABLE.to_string());
            return Err(e.into());
        }

        let user = match self.users.register(&request).await {
            Ok(user) => user,
            Err(e) => {
                let err = IfastError::from(e);
                self.state.last_error = Some(signup_error_message(&err));
                return Err(err);
            }
        };
        tracing::info!("Registered user {}", user.id.unwrap_or(-1));
        self.state.current_user = Some(user);

        match self.login(&request.username, password).await {
            Ok(()) => Ok(SignupOutcome::LoggedIn),
            Err(e) => {
                tracing::warn!("Automatic login after signup failed: {}", e);
                self.state.last_error = Some(SIGNUP_LOGIN_REQUIRED.to_string());
                Ok(SignupOutcome::LoginRequired)
            }
        }
    }

    /// Ends the session. A failed server call is logged; local state and
    /// stored tokens are cleared either way.
    pub async fn logout(&mut self) {
        if let Err(e) = self.auth.logout().await {
            tracing::warn!("Logout request failed: {}", e);
        }
        self.state.authenticated = false;
        self.state.current_user = None;
    }

    /// Refreshes the access token. Failure signs the session out.
    pub async fn refresh(&mut self) -> bool {
        match self.auth.refresh().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                self.state.authenticated = false;
                false
            }
        }
    }

    /// Re-fetches the current user. Failure signs the session out.
    pub async fn refresh_user(&mut self) -> bool {
        match self.users.current_user().await {
            Ok(user) => {
                self.state.current_user = Some(user);
                true
            }
            Err(e) => {
                tracing::warn!("Failed to fetch current user: {}", e);
                self.state.authenticated = false;
                false
            }
        }
    }

    /// Saves and deletes a throwaway pair. Any pair stored before is gone
    /// afterwards.
    fn probe_token_store(&self) -> Result<(), ifast_api::TokenStoreError> {
        let store = self.auth.client().token_store();
        store.save(&TokenPair::new("test", "test"))?;
        store.delete()
    }
}

fn input_message(err: &IfastError) -> String {
    match err {
        IfastError::InvalidInput(msg) => msg.clone(),
        other => other.to_string(),
    }
}

/// User-facing message for a failed login.
pub fn login_error_message(err: &IfastError) -> String {
    let api = match err {
        IfastError::Api(e) => e,
        IfastError::TokenStore(e) => return token_store_message("Login failed", e),
        other => return format!("Login failed: {}", other),
    };
    if let Some(status) = api.status() {
        return match status {
            401 => "Invalid username or password. Please check your credentials.".to_string(),
            400 => "Invalid login data. Please check your input.".to_string(),
            422 => "Validation failed. Please check your credentials.".to_string(),
            code => format!("Login failed with status code: {}", code),
        };
    }
    common_api_message("Login failed", api)
}

/// User-facing message for a failed registration.
pub fn signup_error_message(err: &IfastError) -> String {
    let api = match err {
        IfastError::Api(e) => e,
        IfastError::InvalidInput(msg) => return msg.clone(),
        IfastError::TokenStore(e) => return token_store_message("Signup failed", e),
        other => return format!("Signup failed: {}", other),
    };
    match api.status() {
        Some(409) => {
            "Username or email already exists. Please choose different credentials.".to_string()
        }
        Some(400) => "Invalid signup data. Please check your information.".to_string(),
        Some(422) => "Validation failed. Please check your input.".to_string(),
        Some(401) => "Signup failed: Unauthorized request".to_string(),
        Some(code) => format!("Signup failed with status code: {}", code),
        None => common_api_message("Signup failed", api),
    }
}

fn common_api_message(prefix: &str, err: &ifast_api::Error) -> String {
    match err {
        ifast_api::Error::Decoding(_) => format!("{}: Invalid response from server", prefix),
        ifast_api::Error::Network(msg) => format!("{}: Network error - {}", prefix, msg),
        ifast_api::Error::InvalidUrl => format!("{}: Invalid server configuration", prefix),
        ifast_api::Error::TokenStore(e) => token_store_message(prefix, e),
        other => format!("{}: {}", prefix, other),
    }
}

fn token_store_message(prefix: &str, err: &ifast_api::TokenStoreError) -> String {
    match err {
        ifast_api::TokenStoreError::Encoding(_) => format!(
            "{}: Unable to process authentication tokens. Please try again.",
            prefix
        ),
        other => format!(
            "{}: Unable to save authentication tokens ({}). Please check your settings.",
            prefix, other
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ifast_api::{Error, TokenStoreError};

    fn api(err: Error) -> IfastError {
        IfastError::Api(err)
    }

    fn status(code: u16) -> IfastError {
        api(Error::HttpStatus {
            status: code,
            body: String::new(),
        })
    }

    #[test]
    fn login_messages_by_status() {
        insta::assert_snapshot!(
            login_error_message(&api(Error::Unauthorized)),
            @"Invalid username or password. Please check your credentials."
        );
        assert_eq!(
            login_error_message(&status(400)),
            "Invalid login data. Please check your input."
        );
        assert_eq!(
            login_error_message(&status(422)),
            "Validation failed. Please check your credentials."
        );
        assert_eq!(
            login_error_message(&status(503)),
            "Login failed with status code: 503"
        );
    }

    #[test]
    fn login_messages_for_other_failures() {
        assert_eq!(
            login_error_message(&api(Error::Decoding("eof".into()))),
            "Login failed: Invalid response from server"
        );
        assert_eq!(
            login_error_message(&api(Error::Network("connection refused".into()))),
            "Login failed: Network error - connection refused"
        );
        assert_eq!(
            login_error_message(&api(Error::InvalidUrl)),
            "Login failed: Invalid server configuration"
        );
        let encoding = serde_json::from_str::<TokenPair>("{").unwrap_err();
        assert_eq!(
            login_error_message(&api(Error::TokenStore(TokenStoreError::Encoding(encoding)))),
            "Login failed: Unable to process authentication tokens. Please try again."
        );
    }

    #[test]
    fn signup_messages_by_status() {
        insta::assert_snapshot!(
            signup_error_message(&status(409)),
            @"Username or email already exists. Please choose different credentials."
        );
        assert_eq!(
            signup_error_message(&status(400)),
            "Invalid signup data. Please check your information."
        );
        assert_eq!(
            signup_error_message(&status(422)),
            "Validation failed. Please check your input."
        );
        assert_eq!(
            signup_error_message(&status(500)),
            "Signup failed with status code: 500"
        );
        assert_eq!(
            signup_error_message(&api(Error::Network("timeout".into()))),
            "Signup failed: Network error - timeout"
        );
    }

    #[test]
    fn new_session_is_signed_out() {
        let client = Client::with_base_url(
            "http://127.0.0.1:1",
            Arc::new(ifast_api::MemoryTokenStore::new()),
        )
        .unwrap();
        let session = SessionManager::new(AuthService::new(client));
        assert_eq!(session.state(), &SessionState::default());
    }
}
