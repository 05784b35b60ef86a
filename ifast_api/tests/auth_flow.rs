use std::sync::Arc;

use ifast_api::{
    AuthService, Client, Error, FastingApi, MemoryTokenStore, TokenPair, TokenStore, UserApi,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn load_fixture(name: &str) -> String {
    std::fs::read_to_string(format!("tests/fixtures/{}", name)).unwrap()
}

fn service(uri: &str, store: Arc<MemoryTokenStore>) -> AuthService {
    AuthService::new(Client::with_base_url(uri, store).unwrap())
}

#[tokio::test]
async fn login_persists_tokens_and_current_user_needs_no_credentials() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(serde_json::json!({"username": "ada", "password": "hunter22"})))
        .respond_with(ResponseTemplate::new(200).set_body_string("acc-token|ref-token"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("Authorization", "Bearer acc-token"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("user.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let auth = service(&mock_server.uri(), store.clone());

    let tokens = auth.login("ada", "hunter22").await.unwrap();
    assert_eq!(tokens, TokenPair::new("acc-token", "ref-token"));
    assert_eq!(store.load().unwrap(), Some(tokens));
    assert!(auth.has_tokens().unwrap());

    let users = UserApi::new(auth);
    let me = users.current_user().await.unwrap();
    assert_eq!(me.id, Some(42));

    // The login request itself must not have carried a bearer header.
    let received = mock_server.received_requests().await.unwrap();
    let login = received
        .iter()
        .find(|r| r.url.path() == "/api/auth/login")
        .unwrap();
    assert!(!login.headers.contains_key("authorization"));
}

#[tokio::test]
async fn malformed_login_response_stores_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_string("just-one-token"))
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::new());
    let auth = service(&mock_server.uri(), store.clone());

    let result = auth.login("ada", "hunter22").await;
    assert!(matches!(result, Err(Error::Decoding(_))));
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn expired_access_token_is_refreshed_and_request_retried_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(query_param("refreshToken", "still-good"))
        .respond_with(ResponseTemplate::new(200).set_body_string("fresh"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("user.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new(
        "stale",
        "still-good",
    )));
    let users = UserApi::new(service(&mock_server.uri(), store.clone()));

    let me = users.current_user().await.unwrap();
    assert_eq!(me.username.as_deref(), Some("ada"));
    assert_eq!(
        store.load().unwrap(),
        Some(TokenPair::new("fresh", "still-good"))
    );
}

#[tokio::test]
async fn second_unauthorized_propagates_without_further_retries() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/fasting/records"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("also-rejected"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let fasting = FastingApi::new(service(&mock_server.uri(), store));

    let result = fasting.records().await;
    assert!(matches!(result, Err(Error::Unauthorized)));
}

#[tokio::test]
async fn failed_refresh_is_surfaced_as_is() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/fasting/statistics"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(403).set_body_string("refresh token revoked"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let fasting = FastingApi::new(service(&mock_server.uri(), store.clone()));

    let err = fasting.statistics().await.unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
    // The stored pair is left untouched.
    assert_eq!(store.load().unwrap(), Some(TokenPair::new("a", "r")));
}

#[tokio::test]
async fn no_stored_tokens_skips_refresh_and_retries_once() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x"))
        .expect(0)
        .mount(&mock_server)
        .await;

    let users = UserApi::new(service(
        &mock_server.uri(),
        Arc::new(MemoryTokenStore::new()),
    ));
    let result = users.current_user().await;
    assert!(matches!(result, Err(Error::Unauthorized)));
}

#[tokio::test]
async fn non_401_errors_are_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let users = UserApi::new(service(&mock_server.uri(), store));
    let result = users.current_user().await;
    assert!(matches!(result, Err(Error::HttpStatus { status: 503, .. })));
}

#[tokio::test]
async fn logout_clears_tokens_even_when_server_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let auth = service(&mock_server.uri(), store.clone());

    let result = auth.logout().await;
    assert!(matches!(result, Err(Error::HttpStatus { status: 500, .. })));
    assert_eq!(store.load().unwrap(), None);
}

#[tokio::test]
async fn logout_success_clears_tokens() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/auth/logout"))
        .and(header("Authorization", "Bearer a"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Logged out"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let auth = service(&mock_server.uri(), store.clone());

    auth.logout().await.unwrap();
    assert!(!auth.has_tokens().unwrap());
}

#[tokio::test]
async fn register_is_public() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/users/register"))
        .and(body_json(serde_json::json!({
            "username": "ada",
            "email": "ada@example.com",
            "password": "hunter22",
            "firstName": "Ada",
            "lastName": "Lovelace"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_string(load_fixture("user.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let users = UserApi::new(service(&mock_server.uri(), store));
    let request = ifast_api::types::UserRegistrationRequest {
        username: "ada".to_string(),
        email: "ada@example.com".to_string(),
        password: "hunter22".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    };
    let user = users.register(&request).await.unwrap();
    assert_eq!(user.email.as_deref(), Some("ada@example.com"));

    let received = mock_server.received_requests().await.unwrap();
    assert!(!received[0].headers.contains_key("authorization"));
}

#[tokio::test]
async fn profile_update_sends_names_as_query() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/users/42/profile"))
        .and(query_param("firstName", "Augusta"))
        .and(query_param("lastName", "King"))
        .respond_with(ResponseTemplate::new(200).set_body_string(load_fixture("user.json")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let users = UserApi::new(service(&mock_server.uri(), store));
    users.update_profile(42, "Augusta", "King").await.unwrap();
}

#[tokio::test]
async fn records_filtered_by_date_range_and_type() {
    let mock_server = MockServer::start().await;
    let body = load_fixture("records.json");

    Mock::given(method("GET"))
        .and(path("/api/fasting/records"))
        .and(query_param("startDate", "2024-01-15T00:00:00Z"))
        .and(query_param("endDate", "2024-01-22T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_string(&body))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/fasting/records"))
        .and(query_param("type", "18:6"))
        .respond_with(ResponseTemplate::new(200).set_body_string("[]"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let fasting = FastingApi::new(service(&mock_server.uri(), store));

    use chrono::TimeZone;
    let start = chrono::Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
    let end = chrono::Utc.with_ymd_and_hms(2024, 1, 22, 0, 0, 0).unwrap();
    let records = fasting.records_between(start, end).await.unwrap();
    assert_eq!(records.len(), 2);

    let by_type = fasting
        .records_by_type(ifast_api::types::FastType::EighteenSix)
        .await
        .unwrap();
    assert!(by_type.is_empty());
}

#[tokio::test]
async fn record_crud_paths() {
    let mock_server = MockServer::start().await;
    let records: Vec<ifast_api::types::FastRecord> =
        serde_json::from_str(&load_fixture("records.json")).unwrap();
    let record = records[0].clone();
    let record_json = serde_json::to_value(&record).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/fasting/records"))
        .and(body_json(record_json.clone()))
        .respond_with(ResponseTemplate::new(201).set_body_json(record_json.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("/api/fasting/records/{}", record.id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(record_json.clone()))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path(format!("/api/fasting/records/{}", record.id)))
        .respond_with(ResponseTemplate::new(200).set_body_string("Deleted"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = Arc::new(MemoryTokenStore::with_tokens(TokenPair::new("a", "r")));
    let fasting = FastingApi::new(service(&mock_server.uri(), store));

    let created = fasting.create(&record).await.unwrap();
    assert_eq!(created.id, record.id);
    let updated = fasting.update(&record).await.unwrap();
    assert_eq!(updated, record);
    assert_eq!(fasting.delete(record.id).await.unwrap(), "Deleted");
}
