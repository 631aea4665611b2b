use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use accounts_api::password::{hash_password, verify_password};
use accounts_api::repository::AccountRepository;
use accounts_api::sqlite_repo::SqliteRepository;
use accounts_api::{build_app, db, AppState};

const CREATE_USER_URL: &str = "/api/user/create/";
const TOKEN_URL: &str = "/api/user/token/";
const ME_URL: &str = "/api/user/me/";

// -- Helpers ------------------------------------------------------------------

async fn setup_app() -> (axum::Router, Arc<SqliteRepository>) {
    let pool = db::init_pool("sqlite::memory:").await.unwrap();
    let repo = Arc::new(SqliteRepository::new(pool));
    let state = AppState {
        repo: repo.clone(),
        min_password_length: 6,
    };
    (build_app(state), repo)
}

async fn json_request(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let has_body = body.is_some();
    let body_str = body.map(|b| b.to_string()).unwrap_or_default();
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Token {token}"));
    }
    if has_body {
        builder = builder.header("content-type", "application/json");
    }

    let req = builder.body(Body::from(body_str)).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    let value: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

/// Insert an account directly, skipping the HTTP validation rules.
async fn create_user(repo: &SqliteRepository, email: &str, password: &str, name: &str) {
    let hash = hash_password(password).unwrap();
    repo.create_account(email, name, &hash).await.unwrap();
}

/// Create an account and return a token for it.
async fn authenticated_user(app: &axum::Router, repo: &SqliteRepository) -> String {
    create_user(repo, "test@example.com", "testpass", "Name").await;
    let (status, body) = json_request(
        app,
        "POST",
        TOKEN_URL,
        None,
        Some(json!({ "email": "test@example.com", "password": "testpass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

// -- Public API ---------------------------------------------------------------

#[tokio::test]
async fn test_create_valid_user_success() {
    let (app, repo) = setup_app().await;

    let (status, body) = json_request(
        &app,
        "POST",
        CREATE_USER_URL,
        None,
        Some(json!({ "email": "test@example.com", "password": "testpass", "name": "Name" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(body.get("password").is_none());
    assert_eq!(body["email"], "test@example.com");
    assert_eq!(body["name"], "Name");

    let account = repo.find_by_email("test@example.com").await.unwrap().unwrap();
    assert!(verify_password("testpass", &account.password_hash).unwrap());
    assert_ne!(account.password_hash, "testpass");
}

#[tokio::test]
async fn test_user_exists() {
    let (app, _repo) = setup_app().await;
    let payload = json!({ "email": "test@example.com", "password": "testpass", "name": "Test" });

    let (status, _) = json_request(&app, "POST", CREATE_USER_URL, None, Some(payload.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = json_request(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn test_user_exists_with_different_domain_case() {
    let (app, repo) = setup_app().await;
    create_user(&repo, "test@example.com", "testpass", "Test").await;

    let (status, _) = json_request(
        &app,
        "POST",
        CREATE_USER_URL,
        None,
        Some(json!({ "email": "test@EXAMPLE.com", "password": "testpass", "name": "Test" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_password_too_short() {
    let (app, repo) = setup_app().await;

    let (status, _) = json_request(
        &app,
        "POST",
        CREATE_USER_URL,
        None,
        Some(json!({ "email": "test@example.com", "password": "pw", "name": "Test" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!repo.email_exists("test@example.com").await.unwrap());
}

#[tokio::test]
async fn test_password_blank() {
    let (app, repo) = setup_app().await;

    let (status, _) = json_request(
        &app,
        "POST",
        CREATE_USER_URL,
        None,
        Some(json!({ "email": "test@example.com", "password": "      ", "name": "Test" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!repo.email_exists("test@example.com").await.unwrap());
}

#[tokio::test]
async fn test_create_user_invalid_fields() {
    let (app, repo) = setup_app().await;

    for payload in [
        json!({ "email": "not-an-email", "password": "testpass", "name": "Test" }),
        json!({ "email": "test@example.com", "password": "testpass", "name": "  " }),
        json!({ "email": "test@example.com", "password": "testpass" }),
        json!({ "password": "testpass", "name": "Test" }),
    ] {
        let (status, _) = json_request(&app, "POST", CREATE_USER_URL, None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    assert!(!repo.email_exists("test@example.com").await.unwrap());
}

#[tokio::test]
async fn test_create_user_malformed_json() {
    let (app, _repo) = setup_app().await;

    let req = Request::builder()
        .method("POST")
        .uri(CREATE_USER_URL)
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_token_for_user() {
    let (app, repo) = setup_app().await;
    // Short passwords stored out of band can still authenticate.
    create_user(&repo, "test@example.com", "pw", "Test").await;

    let (status, body) = json_request(
        &app,
        "POST",
        TOKEN_URL,
        None,
        Some(json!({ "email": "test@example.com", "password": "pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.get("token").is_some());
    assert_eq!(body["token"].as_str().unwrap().len(), 40);
}

#[tokio::test]
async fn test_create_token_is_stable_per_user() {
    let (app, repo) = setup_app().await;
    create_user(&repo, "test@example.com", "testpass", "Test").await;
    let payload = json!({ "email": "test@example.com", "password": "testpass" });

    let (_, first) = json_request(&app, "POST", TOKEN_URL, None, Some(payload.clone())).await;
    let (_, second) = json_request(&app, "POST", TOKEN_URL, None, Some(payload)).await;

    assert_eq!(first["token"], second["token"]);
}

#[tokio::test]
async fn test_create_token_invalid_credentials() {
    let (app, repo) = setup_app().await;
    create_user(&repo, "test@example.com", "pass", "Test").await;

    let (status, body) = json_request(
        &app,
        "POST",
        TOKEN_URL,
        None,
        Some(json!({ "email": "test@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_create_token_no_user() {
    let (app, _repo) = setup_app().await;

    let (status, body) = json_request(
        &app,
        "POST",
        TOKEN_URL,
        None,
        Some(json!({ "email": "test@example.com", "password": "pass" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_create_token_missing_field() {
    let (app, _repo) = setup_app().await;

    for payload in [
        json!({ "email": "test@example.com", "password": "" }),
        json!({ "email": "", "password": "testpass" }),
        json!({ "email": "test@example.com" }),
    ] {
        let (status, body) = json_request(&app, "POST", TOKEN_URL, None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("token").is_none());
    }
}

#[tokio::test]
async fn test_retrieve_user_unauthorized() {
    let (app, _repo) = setup_app().await;

    let (status, _) = json_request(&app, "GET", ME_URL, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_retrieve_user_bad_token() {
    let (app, _repo) = setup_app().await;

    let (status, _) = json_request(&app, "GET", ME_URL, Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let unknown = "0000000000000000000000000000000000000000";
    let (status, _) = json_request(&app, "GET", ME_URL, Some(unknown), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_post_me_not_allowed_unauthenticated() {
    let (app, _repo) = setup_app().await;

    let (status, _) = json_request(&app, "POST", ME_URL, None, Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

// -- Private API --------------------------------------------------------------

#[tokio::test]
async fn test_retrieve_profile_success() {
    let (app, repo) = setup_app().await;
    let token = authenticated_user(&app, &repo).await;

    let (status, body) = json_request(&app, "GET", ME_URL, Some(&token), None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "Name", "email": "test@example.com" }));
}

#[tokio::test]
async fn test_post_me_not_allowed() {
    let (app, repo) = setup_app().await;
    let token = authenticated_user(&app, &repo).await;

    let (status, _) = json_request(&app, "POST", ME_URL, Some(&token), Some(json!({}))).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_update_user_profile() {
    let (app, repo) = setup_app().await;
    let token = authenticated_user(&app, &repo).await;

    let (status, body) = json_request(
        &app,
        "PATCH",
        ME_URL,
        Some(&token),
        Some(json!({ "name": "new name", "password": "newpassword123" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "name": "new name", "email": "test@example.com" }));

    let account = repo.find_by_email("test@example.com").await.unwrap().unwrap();
    assert_eq!(account.name, "new name");
    assert!(verify_password("newpassword123", &account.password_hash).unwrap());
    assert!(!verify_password("testpass", &account.password_hash).unwrap());
}

#[tokio::test]
async fn test_update_only_supplied_fields() {
    let (app, repo) = setup_app().await;
    let token = authenticated_user(&app, &repo).await;

    let (status, body) = json_request(
        &app,
        "PATCH",
        ME_URL,
        Some(&token),
        Some(json!({ "name": "Renamed" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "test@example.com");

    let account = repo.find_by_email("test@example.com").await.unwrap().unwrap();
    assert_eq!(account.name, "Renamed");
    assert!(verify_password("testpass", &account.password_hash).unwrap());
}

#[tokio::test]
async fn test_update_rejects_short_password() {
    let (app, repo) = setup_app().await;
    let token = authenticated_user(&app, &repo).await;

    let (status, _) = json_request(
        &app,
        "PATCH",
        ME_URL,
        Some(&token),
        Some(json!({ "password": "pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let account = repo.find_by_email("test@example.com").await.unwrap().unwrap();
    assert!(verify_password("testpass", &account.password_hash).unwrap());
}

#[tokio::test]
async fn test_update_email_to_taken_address() {
    let (app, repo) = setup_app().await;
    let token = authenticated_user(&app, &repo).await;
    create_user(&repo, "other@example.com", "testpass", "Other").await;

    let (status, _) = json_request(
        &app,
        "PATCH",
        ME_URL,
        Some(&token),
        Some(json!({ "email": "other@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = json_request(
        &app,
        "PATCH",
        ME_URL,
        Some(&token),
        Some(json!({ "email": "new@Example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "new@example.com");
}

#[tokio::test]
async fn test_health_check() {
    let (app, _repo) = setup_app().await;

    let (status, body) = json_request(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}
