use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

use crate::{
    routes::{create_routes, serve},
    service::mocks::{InMemoryUserStore, account_service},
    state::AppState,
};
use app_config::AppConfig;
use app_database::UserStore;

fn setup_test_app() -> (Router, Arc<InMemoryUserStore>) {
    let store = Arc::new(InMemoryUserStore::default());
    let accounts = Arc::new(account_service(store.clone()));
    let state = AppState::new(accounts.clone(), accounts.get_jwt_service());

    (create_routes(state, &AppConfig::default()), store)
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    body: Option<Value>,
    token: Option<&str>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn register(app: &Router, username: &str, email: &str) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/register",
        Some(json!({"username": username, "email": email, "password": "pw123"})),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
    body
}

async fn login(app: &Router, username: &str, password: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        "/login",
        Some(json!({"username": username, "password": password})),
        None,
    )
    .await
}

#[tokio::test]
async fn test_health_check() {
    let (app, _) = setup_test_app();
    let (status, body) = send(&app, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_register_returns_public_profile() {
    let (app, _) = setup_test_app();
    let body = register(&app, "alice", "Alice@Example.com").await;

    assert_eq!(body["username"], "alice");
    assert_eq!(body["email"], "alice@example.com");
    assert!(body["id"].is_string());
    assert!(body.get("password_hash").is_none());
    assert!(body.get("password").is_none());
}

#[tokio::test]
async fn test_register_missing_fields() {
    let (app, store) = setup_test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/register",
        Some(json!({"username": "alice"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "missing required Register fields");
    assert_eq!(body["status"], StatusCode::BAD_REQUEST.to_string());
    assert_eq!(store.len(), 0);
}

#[tokio::test]
async fn test_register_malformed_json() {
    let (app, _) = setup_test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/register")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let (app, store) = setup_test_app();
    register(&app, "alice", "alice@x.com").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/register",
        Some(json!({"username": "alice2", "email": "ALICE@x.com", "password": "pw123"})),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user already exists");
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_login_failures_look_identical() {
    let (app, _) = setup_test_app();
    register(&app, "alice", "alice@x.com").await;

    let unknown = login(&app, "nobody", "pw123").await;
    let wrong_password = login(&app, "alice", "nope").await;

    assert_eq!(unknown.0, StatusCode::BAD_REQUEST);
    assert_eq!(unknown, wrong_password);
}

#[tokio::test]
async fn test_login_returns_token() {
    let (app, _) = setup_test_app();
    let profile = register(&app, "alice", "alice@x.com").await;

    let (status, body) = login(&app, "alice", "pw123").await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["id"], profile["id"]);
    assert_eq!(body["email"], "alice@x.com");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let (app, store) = setup_test_app();
    let profile = register(&app, "alice", "alice@x.com").await;
    let id = profile["id"].as_str().unwrap();

    let (status, body) = send(&app, Method::DELETE, &format!("/users/{}", id), None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert!(store.get_by_id(id).await.unwrap().is_some());

    let (status, _) = send(&app, Method::GET, "/users", None, Some("garbage")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_list_add_and_delete_users() {
    let (app, store) = setup_test_app();
    register(&app, "alice", "alice@x.com").await;
    let (_, auth) = login(&app, "alice", "pw123").await;
    let token = auth["token"].as_str().unwrap();

    let (status, added) = send(
        &app,
        Method::POST,
        "/users",
        Some(json!({"username": "bob", "email": "bob@x.com", "password": "pw123"})),
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, users) = send(&app, Method::GET, "/users", None, Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.as_array().unwrap().len(), 2);

    let bob_id = added["id"].as_str().unwrap();
    let (status, deleted) = send(
        &app,
        Method::DELETE,
        &format!("/users/{}", bob_id),
        None,
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(deleted["username"], "bob");
    assert_eq!(store.len(), 1);

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/users/{}", bob_id),
        None,
        Some(token),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "user not found");
}

#[tokio::test]
async fn test_security_headers_present() {
    let (app, _) = setup_test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
    assert!(response.headers().get("x-request-id").is_some());
}

#[tokio::test]
async fn test_served_requests_carry_peer_address() {
    use app_middleware::api_middleware::get_client_ip;
    use axum::routing::get;
    use std::io::{Read, Write};

    let app = Router::new().route(
        "/ip",
        get(|req: Request<Body>| async move {
            get_client_ip(&req).map(|ip| ip.to_string()).unwrap_or_default()
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(serve(listener, app, async {
        let _ = stopped.await;
    }));

    let response = tokio::task::spawn_blocking(move || {
        let mut stream = std::net::TcpStream::connect(address).unwrap();
        stream
            .write_all(b"GET /ip HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    })
    .await
    .unwrap();

    assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
    assert!(response.ends_with("127.0.0.1"), "{}", response);

    stop.send(()).unwrap();
    server.await.unwrap().unwrap();
}
