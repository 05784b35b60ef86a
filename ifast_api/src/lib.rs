//! Client for the iFast fasting-tracker REST API.
//!
//! [`Client`] issues single requests with bearer authorization;
//! [`AuthService`] adds login, refresh and the refresh-once retry policy;
//! [`UserApi`] and [`FastingApi`] wrap the individual endpoints.

mod auth;
mod client;
pub mod dates;
mod errors;
mod fasting;
mod request;
mod token;
pub mod types;
mod users;
pub use self::auth::{AuthService, LOGIN_PATH, LOGOUT_PATH, REFRESH_PATH};
pub use self::client::{Client, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use self::errors::Error;
pub use self::fasting::{FastingApi, RECORDS_PATH, STATISTICS_PATH};
pub use self::request::ApiRequest;
pub use self::token::{MemoryTokenStore, TokenPair, TokenStore, TokenStoreError};
pub use self::users::UserApi;
