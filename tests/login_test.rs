#[path = "common/mod.rs"]
mod common;

use std::sync::Arc;

use axum::http::{HeaderMap, StatusCode, header};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use serial_test::serial;

use common::BoardCli;
use ticketboard::{BoardError, ErrorKind, HttpTicketRepository, Role, Session};

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    match (body["email"].as_str(), body["password"].as_str()) {
        (Some("alice@example.com"), Some("hunter2")) => {
            (StatusCode::OK, Json(json!({"token": "tok-alice"})))
        }
        (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid credentials"})),
        ),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Email and password are required"})),
        ),
    }
}

async fn me(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some("Bearer tok-alice") => (
            StatusCode::OK,
            Json(json!({"id": 1, "username": "alice", "role": "admin"})),
        ),
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"msg": "Missing Authorization Header"})),
        ),
    }
}

/// Serve the auth endpoints on an ephemeral port and return the base URL
async fn serve() -> String {
    let app = Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/users/me", get(me));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

/// Run the binary off the runtime so the server keeps answering
async fn run_cli(cli: BoardCli, args: Vec<String>) -> (BoardCli, std::process::Output) {
    tokio::task::spawn_blocking(move || {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = cli.run(&args);
        (cli, output)
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_login_returns_token_for_profile_lookup() {
    let base = serve().await;
    let session = Arc::new(Session::anonymous());
    let repo = HttpTicketRepository::new(&base, session.clone()).unwrap();

    let token = repo.login("alice@example.com", "hunter2").await.unwrap();
    assert_eq!(token, "tok-alice");

    session.set_token(token);
    let user = repo.fetch_profile().await.unwrap();
    assert_eq!(user.username, "alice");
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn test_wrong_password_is_authorization_error() {
    let base = serve().await;
    let repo = HttpTicketRepository::new(&base, Arc::new(Session::anonymous())).unwrap();

    let err = repo.login("alice@example.com", "wrong").await.unwrap_err();
    assert_eq!(err.status, Some(reqwest::StatusCode::UNAUTHORIZED));
    assert_eq!(err.message, "Invalid credentials");

    let err = BoardError::from(err);
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_cli_login_stores_token_and_logout_clears_it() {
    let base = serve().await;
    let cli = BoardCli::new();

    let args = ["--api-url", base.as_str(), "login", "alice@example.com", "--password", "hunter2"]
        .map(String::from)
        .to_vec();
    let (cli, output) = run_cli(cli, args).await;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Logged in as"));
    assert!(stdout.contains("alice"));

    let saved = std::fs::read_to_string(cli.config_path()).unwrap();
    assert!(saved.contains("tok-alice"));

    let stdout = cli.run_success(&["logout"]);
    assert!(stdout.contains("Logged out"));
    let saved = std::fs::read_to_string(cli.config_path()).unwrap();
    assert!(!saved.contains("tok-alice"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_cli_login_with_bad_credentials_fails() {
    let base = serve().await;
    let cli = BoardCli::new();

    let args = ["--api-url", base.as_str(), "login", "alice@example.com", "--password", "nope"]
        .map(String::from)
        .to_vec();
    let (cli, output) = run_cli(cli, args).await;
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Invalid credentials"));
    assert!(!cli.config_path().exists());
}

#[test]
#[serial]
fn test_cli_login_requires_password() {
    let cli = BoardCli::new();

    let stderr = cli.run_failure(&["login", "alice@example.com", "--password", ""]);
    assert!(stderr.contains("Email and password are required"));
}
