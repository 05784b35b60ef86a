//! Request descriptor passed to [`crate::Client`].

use reqwest::Method;
use serde::Serialize;

use crate::Error;

/// Everything the client needs to issue one API call.
///
/// Requests require authorization unless [`ApiRequest::public`] is called.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub path: String,
    pub method: Method,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub requires_auth: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            query: Vec::new(),
            body: None,
            requires_auth: true,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter. Order is preserved.
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Serializes `body` as the JSON payload.
    pub fn with_json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, Error> {
        let value = serde_json::to_value(body).map_err(|e| {
            tracing::error!("Failed to serialize request body: {}", e);
            Error::Decoding(format!("request body: {}", e))
        })?;
        self.body = Some(value);
        Ok(self)
    }

    /// Marks the request as not needing an `Authorization` header.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_authenticated() {
        let req = ApiRequest::get("/api/users/me");
        assert!(req.requires_auth);
        assert_eq!(req.method, Method::GET);
        assert!(req.body.is_none());
        assert!(req.query.is_empty());
    }

    #[test]
    fn builder_keeps_query_order() {
        let req = ApiRequest::put("/api/users/7/profile")
            .with_query("firstName", "Ada")
            .with_query("lastName", "Lovelace")
            .public();
        assert!(!req.requires_auth);
        assert_eq!(
            req.query,
            vec![
                ("firstName".to_string(), "Ada".to_string()),
                ("lastName".to_string(), "Lovelace".to_string()),
            ]
        );
    }

    #[test]
    fn json_body_is_captured() {
        let req = ApiRequest::put("/api/users/7/roles")
            .with_json(&["ADMIN", "USER"])
            .unwrap();
        assert_eq!(req.body, Some(serde_json::json!(["ADMIN", "USER"])));
    }
}
