use app_database::{SurrealUserStore, UserStore};
use app_error::AppResult;
use app_test::TestApp;
use axum::http::{Method, StatusCode};
use serde_json::{Value, json};
use std::sync::Arc;

async fn register(app: &TestApp, username: &str, email: &str, password: &str) -> (StatusCode, Value) {
    app.request(
        Method::POST,
        "/register",
        Some(json!({"username": username, "email": email, "password": password})),
        None,
    )
    .await
}

async fn login_token(app: &TestApp, username: &str, password: &str) -> String {
    let (status, body) = app
        .request(
            Method::POST,
            "/login",
            Some(json!({"username": username, "password": password})),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "login failed: {}", body);
    body["token"].as_str().expect("token in login response").to_string()
}

#[tokio::test]
async fn test_health_check_endpoint() -> AppResult<()> {
    let app = TestApp::spawn().await?;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    Ok(())
}

#[tokio::test]
async fn test_register_login_list_flow() -> AppResult<()> {
    let app = TestApp::spawn().await?;

    let (status, profile) = register(&app, "bob", "bob@x.com", "pw123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["username"], "bob");

    let token = login_token(&app, "bob", "pw123").await;
    assert_eq!(app.jwt_service.validate(&token).unwrap(), profile["id"]);

    let (status, users) = app.request(Method::GET, "/users", None, Some(&token)).await;
    assert_eq!(status, StatusCode::OK);

    let users = users.as_array().expect("list of users");
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["username"], "bob");
    assert_eq!(users[0]["email"], "bob@x.com");

    // The hash must never leave the service
    let raw = serde_json::to_string(users).unwrap();
    assert!(!raw.contains("password"));
    assert!(!raw.contains("$argon2"));
    Ok(())
}

#[tokio::test]
async fn test_email_is_case_normalized() -> AppResult<()> {
    let app = TestApp::spawn().await?;

    let (status, profile) = register(&app, "alice", "A@x.com", "pw123").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile["email"], "a@x.com");

    let store = SurrealUserStore::new(Arc::clone(&app.db)).await?;
    let found = store.get_by_email("a@x.com").await?.expect("stored user");
    assert_eq!(found.username, "alice");

    let (status, body) = register(&app, "alice2", "a@X.COM", "pw123").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user already exists");
    Ok(())
}

#[tokio::test]
async fn test_duplicate_username_leaves_one_row() -> AppResult<()> {
    let app = TestApp::spawn().await?;

    register(&app, "carol", "carol@x.com", "pw123").await;
    let (status, body) = register(&app, "carol", "other@x.com", "pw123").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "CONFLICT");

    let store = SurrealUserStore::new(Arc::clone(&app.db)).await?;
    assert_eq!(store.list_all().await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_login_does_not_reveal_which_part_failed() -> AppResult<()> {
    let app = TestApp::spawn().await?;
    register(&app, "dave", "dave@x.com", "pw123").await;

    let login = |username: &'static str, password: &'static str| {
        app.request(
            Method::POST,
            "/login",
            Some(json!({"username": username, "password": password})),
            None,
        )
    };

    let unknown = login("nobody", "pw123").await;
    let wrong_password = login("dave", "wrong").await;

    assert_eq!(unknown.0, StatusCode::BAD_REQUEST);
    assert_eq!(unknown, wrong_password);
    Ok(())
}

#[tokio::test]
async fn test_unauthorized_delete_keeps_record() -> AppResult<()> {
    let app = TestApp::spawn().await?;
    let (_, profile) = register(&app, "erin", "erin@x.com", "pw123").await;
    let id = profile["id"].as_str().expect("id").to_string();
    let uri = format!("/users/{}", id);

    let (status, body) = app.request(Method::DELETE, &uri, None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let (status, _) = app
        .request(Method::DELETE, &uri, None, Some("not.a.token"))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let store = SurrealUserStore::new(Arc::clone(&app.db)).await?;
    assert!(store.get_by_id(&id).await?.is_some());

    let token = login_token(&app, "erin", "pw123").await;
    let (status, deleted) = app.request(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(deleted["id"], id.as_str());
    assert!(store.get_by_id(&id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_expired_token_is_rejected() -> AppResult<()> {
    let app = TestApp::spawn().await?;
    let token = app
        .jwt_service
        .issue_with_ttl("someone", chrono::Duration::seconds(-5))
        .unwrap();

    let (status, _) = app.request(Method::GET, "/users", None, Some(&token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    Ok(())
}
