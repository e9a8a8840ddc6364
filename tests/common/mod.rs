//! Shared test harness: in-process router over an in-memory database with
//! a capture mail transport, driven as a tower service.

use std::sync::{Arc, Mutex};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{Value, json};
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;
use tower::Service;

use ecomarket_server::auth::{JwtConfig, JwtService};
use ecomarket_server::core::{Config, ServerState, build_router};
use ecomarket_server::db::MIGRATOR;
use ecomarket_server::services::{Mailer, OutboundEmail};

pub struct TestApp {
    pub router: Router,
    pub pool: SqlitePool,
    pub outbox: Arc<Mutex<Vec<OutboundEmail>>>,
    // Held so the uploads/work dir outlives the test.
    #[allow(dead_code)]
    work_dir: tempfile::TempDir,
}

pub async fn spawn_app() -> TestApp {
    let work_dir = tempfile::tempdir().expect("failed to create temp work dir");

    // Single connection: every `sqlite::memory:` connection is its own DB.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("failed to open in-memory database");
    MIGRATOR.run(&pool).await.expect("migrations failed");

    let config = Config::with_overrides(work_dir.path().to_string_lossy().to_string(), 0);
    config
        .ensure_work_dir_structure()
        .expect("failed to create work dir structure");

    let jwt_service = JwtService::with_config(JwtConfig {
        secret: "integration-test-secret-key-0123456789".to_string(),
        issuer: "ecomarket-server".to_string(),
        audience: "ecomarket-clients".to_string(),
    });
    let (mailer, outbox) = Mailer::capture();

    let state = ServerState::new(config, pool.clone(), jwt_service, mailer);
    let router = build_router(state);

    TestApp {
        router,
        pool,
        outbox,
        work_dir,
    }
}

impl TestApp {
    /// Fire one JSON request at the in-process service.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(v) => builder
                .header("content-type", "application/json")
                .body(Body::from(v.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let mut service = self.router.clone();
        let response = service.call(request).await.expect("request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Raw request with full control over headers/body (multipart tests).
    pub async fn raw_request(
        &self,
        request: Request<Body>,
    ) -> (StatusCode, Value) {
        let mut service = self.router.clone();
        let response = service.call(request).await.expect("request failed");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// The most recently captured outbound email.
    pub fn last_email(&self) -> OutboundEmail {
        self.outbox
            .lock()
            .unwrap()
            .last()
            .expect("no email captured")
            .clone()
    }
}

/// Pull the 6-digit login code out of a captured email body.
pub fn extract_code(body: &str) -> String {
    body.split(|c: char| !c.is_ascii_digit())
        .find(|t| t.len() == 6)
        .expect("no 6-digit code in email body")
        .to_string()
}

/// Full signup → login → verify flow; returns (token, user_id).
pub async fn authenticate(app: &TestApp, username: &str, email: &str, password: &str) -> (String, i64) {
    let (status, body) = app
        .request(
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({ "username": username, "email": email, "password": password })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    let user_id = body["user"]["id"].as_i64().expect("user id missing");

    let (status, body) = app
        .request(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": email, "password": password })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");

    let code = extract_code(&app.last_email().body);
    let (status, body) = app
        .request(
            "POST",
            "/api/auth/verify-otp",
            None,
            Some(json!({ "email": email, "code": code })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "verify-otp failed: {body}");

    let token = body["token"].as_str().expect("token missing").to_string();
    (token, user_id)
}

/// Create a product listing; returns its id.
pub async fn list_product(
    app: &TestApp,
    token: &str,
    title: &str,
    price: f64,
    co2_saved: f64,
) -> i64 {
    let (status, body) = app
        .request(
            "POST",
            "/api/products",
            Some(token),
            Some(json!({
                "title": title,
                "description": format!("{title} in good shape"),
                "price": price,
                "category": "Home",
                "condition": "Good",
                "co2_saved": co2_saved,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "product creation failed: {body}");
    body["id"].as_i64().expect("product id missing")
}

pub fn shipping_address() -> Value {
    json!({
        "street": "1 Main St",
        "city": "Springfield",
        "state": "IL",
        "zip_code": "62701",
    })
}
