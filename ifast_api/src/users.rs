//! `/api/users` endpoints.

use crate::{
    auth::AuthService,
    request::ApiRequest,
    types::{UserRegistrationRequest, UserResponse},
    Error,
};

/// User account endpoints. Everything except [`UserApi::register`] requires
/// a stored token pair.
#[derive(Clone)]
pub struct UserApi {
    auth: AuthService,
}

impl UserApi {
    pub fn new(auth: AuthService) -> Self {
        Self { auth }
    }

    /// Fetches the user the stored tokens belong to.
    pub async fn current_user(&self) -> Result<UserResponse, Error> {
        self.auth.call(&ApiRequest::get("/api/users/me")).await
    }

    pub async fn user_by_id(&self, id: i64) -> Result<UserResponse, Error> {
        self.auth
            .call(&ApiRequest::get(format!("/api/users/{}", id)))
            .await
    }

    /// Creates a new account. Does not log in.
    pub async fn register(&self, request: &UserRegistrationRequest) -> Result<UserResponse, Error> {
        let req = ApiRequest::post("/api/users/register")
            .with_json(request)?
            .public();
        self.auth.call(&req).await
    }

    pub async fn update_roles(&self, user_id: i64, roles: &[String]) -> Result<String, Error> {
        let req = ApiRequest::put(format!("/api/users/{}/roles", user_id)).with_json(roles)?;
        self.auth.call_text(&req).await
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        first_name: &str,
        last_name: &str,
    ) -> Result<UserResponse, Error> {
        let req = ApiRequest::put(format!("/api/users/{}/profile", user_id))
            .with_query("firstName", first_name)
            .with_query("lastName", last_name);
        self.auth.call(&req).await
    }

    pub async fn lock(&self, user_id: i64) -> Result<String, Error> {
        self.account_action(user_id, "lock").await
    }

    pub async fn unlock(&self, user_id: i64) -> Result<String, Error> {
        self.account_action(user_id, "unlock").await
    }

    pub async fn enable(&self, user_id: i64) -> Result<String, Error> {
        self.account_action(user_id, "enable").await
    }

    pub async fn disable(&self, user_id: i64) -> Result<String, Error> {
        self.account_action(user_id, "disable").await
    }

    pub async fn delete(&self, user_id: i64) -> Result<String, Error> {
        self.auth
            .call_text(&ApiRequest::delete(format!("/api/users/{}", user_id)))
            .await
    }

    async fn account_action(&self, user_id: i64, action: &str) -> Result<String, Error> {
        self.auth
            .call_text(&ApiRequest::post(format!("/api/users/{}/{}", user_id, action)))
            .await
    }
}
