#![allow(dead_code)]

use axum::body::{Body, Bytes};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tower::ServiceExt;
use uuid::Uuid;

use akhbar::app::auth::TokenService;
use akhbar::domain::article::Article;
use akhbar::infra::memory_store::MemoryInteractionStore;
use akhbar::AppState;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

// "0123456789abcdef0123456789abcdef" (32 bytes), test-only
pub const TEST_PASETO_ACCESS_KEY: &str = "MDEyMzQ1Njc4OWFiY2RlZjAxMjM0NTY3ODlhYmNkZWY=";

// ---------------------------------------------------------------------------
// TestApp — shared, lazily initialized once per test binary
// ---------------------------------------------------------------------------

pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub store: MemoryInteractionStore,
    pub tokens: TokenService,
}

pub struct TestResponse {
    pub status: StatusCode,
    body_bytes: Bytes,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body_bytes).unwrap_or(Value::Null)
    }

    pub fn error_message(&self) -> String {
        self.json()["error"].as_str().unwrap_or("").to_string()
    }
}

/// How a request identifies its caller.
#[derive(Clone, Copy)]
pub enum Caller<'a> {
    Anonymous,
    Header(Uuid),
    Bearer(&'a str),
}

static TEST_APP: OnceCell<TestApp> = OnceCell::const_new();

/// Get (or lazily create) the shared TestApp instance.
pub async fn app() -> &'static TestApp {
    TEST_APP.get_or_init(|| async { TestApp::setup(true) }).await
}

impl TestApp {
    pub fn setup(trust_user_id_header: bool) -> Self {
        let key = akhbar::config::decode_key_32("PASETO_ACCESS_KEY", TEST_PASETO_ACCESS_KEY)
            .expect("test key must decode");
        let tokens = TokenService::new(key, 15);
        let store = MemoryInteractionStore::new();
        let state = AppState::new(
            Arc::new(store.clone()),
            None,
            tokens.clone(),
            trust_user_id_header,
        );
        let router = akhbar::http::router(state.clone());

        TestApp {
            router,
            state,
            store,
            tokens,
        }
    }

    // ------------------------------------------------------------------
    // Low-level request helper
    // ------------------------------------------------------------------
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Body>,
        headers: &[(&str, String)],
    ) -> TestResponse {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header("host", "localhost");

        for (key, value) in headers {
            builder = builder.header(*key, value.as_str());
        }

        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(body)
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("oneshot failed");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("failed to collect body")
            .to_bytes();

        TestResponse { status, body_bytes }
    }

    // ------------------------------------------------------------------
    // Convenience HTTP helpers
    // ------------------------------------------------------------------
    fn caller_headers(caller: Caller<'_>) -> Vec<(&'static str, String)> {
        match caller {
            Caller::Anonymous => vec![],
            Caller::Header(user_id) => vec![("user-id", user_id.to_string())],
            Caller::Bearer(token) => vec![("Authorization", format!("Bearer {}", token))],
        }
    }

    pub async fn get(&self, path: &str, caller: Caller<'_>) -> TestResponse {
        let headers = Self::caller_headers(caller);
        self.request(Method::GET, path, None, &headers).await
    }

    pub async fn post_json(&self, path: &str, body: Value, caller: Caller<'_>) -> TestResponse {
        let headers = Self::caller_headers(caller);
        let body = Body::from(serde_json::to_string(&body).unwrap());
        self.request(Method::POST, path, Some(body), &headers).await
    }

    pub async fn post_raw(&self, path: &str, body: &'static str, caller: Caller<'_>) -> TestResponse {
        let headers = Self::caller_headers(caller);
        self.request(Method::POST, path, Some(Body::from(body)), &headers)
            .await
    }

    pub async fn delete(&self, path: &str, caller: Caller<'_>) -> TestResponse {
        let headers = Self::caller_headers(caller);
        self.request(Method::DELETE, path, None, &headers).await
    }

    // ------------------------------------------------------------------
    // Test data helpers
    // ------------------------------------------------------------------

    pub fn create_article(&self, title: &str) -> Article {
        self.store.create_article(title)
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        self.tokens
            .issue_access_token(user_id)
            .expect("issue_access_token failed")
            .token
    }

    /// Sum of all three counters on the article.
    pub async fn store_counters(&self, article_id: Uuid) -> i64 {
        let counters = self
            .state
            .interactions
            .counters(article_id)
            .await
            .expect("counters lookup failed")
            .expect("article missing");
        counters.likes + counters.saves + counters.shares
    }

    /// POST a toggle on the primary route.
    pub async fn toggle(&self, user_id: Uuid, article_id: Uuid, kind: &str) -> TestResponse {
        self.post_json(
            "/api/interactions",
            serde_json::json!({ "article_id": article_id, "type": kind, "action": "toggle" }),
            Caller::Header(user_id),
        )
        .await
    }
}
