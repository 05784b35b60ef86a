use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::flexible;

/// A user as returned by `/api/users/...`. The backend omits fields freely,
/// so everything is optional.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Option<i64>,
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_verified: Option<bool>,
    pub mfa_enabled: Option<bool>,
    pub enabled: Option<bool>,
    #[serde(default, with = "flexible::option")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, with = "flexible::option")]
    pub last_login_at: Option<DateTime<Utc>>,
    pub roles: Option<Vec<String>>,
}

impl UserResponse {
    /// "First Last", falling back to the username.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if full.is_empty() {
            self.username.clone().unwrap_or_default()
        } else {
            full
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistrationRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}
