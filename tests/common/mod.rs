#![allow(dead_code)]

use std::{sync::Arc, time::Duration};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use user_gate::{
    config::Config,
    models::user::NewUser,
    password::hash_password,
    routes::app_router,
    state::AppState,
    store::{RevocationLedger, UserStore},
};

pub const TEST_SECRET: &str = "integration-test-secret";

pub fn test_config() -> Config {
    Config {
        mongodb_uri: None,
        db_name: "user_gate_test".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        jwt_secret: TEST_SECRET.to_string(),
        jwt_issuer: "myapp".to_string(),
        jwt_ttl_seconds: 24 * 60 * 60,
        revocation_prune_interval: Duration::from_secs(3600),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::from_state(AppState::in_memory(test_config()))
    }

    pub fn with_stores(users: Arc<dyn UserStore>, revocations: Arc<dyn RevocationLedger>) -> Self {
        Self::from_state(AppState::new(test_config(), users, revocations))
    }

    fn from_state(state: AppState) -> Self {
        let state = Arc::new(state);
        Self {
            router: app_router(state.clone()),
            state,
        }
    }

    pub async fn seed_user(&self, username: &str, email: &str, password: &str) -> i64 {
        self.state
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash: hash_password(password).expect("hash"),
                role_id: 1,
                client_id: 1,
            })
            .await
            .expect("seed user")
    }

    pub async fn send(&self, req: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(req).await.expect("router call");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, body)
    }

    pub async fn login(&self, email: &str, password: &str) -> (StatusCode, Value) {
        self.send(json_request(
            "POST",
            "/api/login",
            None,
            &serde_json::json!({ "email": email, "password": password }),
        ))
        .await
    }

    pub async fn login_token(&self, email: &str, password: &str) -> String {
        let (status, body) = self.login(email, password).await;
        assert_eq!(status, StatusCode::OK, "login failed: {body}");
        body["token"].as_str().expect("token in body").to_string()
    }
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder
        .body(Body::from(serde_json::to_vec(body).expect("encode body")))
        .expect("build request")
}

pub fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).expect("build request")
}
