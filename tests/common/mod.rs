use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use protected_pages_rust::app::{demo_content, router, AppState};
use protected_pages_rust::auth::{generate_jwt, hash_password, AdminClaims};
use protected_pages_rust::clock::ManualClock;
use protected_pages_rust::config::AppConfig;
use protected_pages_rust::database::MemoryRegistry;
use protected_pages_rust::path::AliasTable;
use protected_pages_rust::session::MemorySessionStore;

pub const PASSWORD: &str = "opensesame";

pub struct TestApp {
    pub router: Router,
    pub registry: MemoryRegistry,
    pub clock: ManualClock,
    pub config: AppConfig,
}

impl TestApp {
    /// App with `/secret` (pid 7) protected and `/secret` aliased to `/node/12`
    pub async fn new() -> Self {
        let registry = MemoryRegistry::new();
        registry.insert_with_pid(7, "/secret", &hash_password(PASSWORD)).await;
        Self::with_registry(registry).await
    }

    pub async fn with_registry(registry: MemoryRegistry) -> Self {
        Self::with_content(registry, demo_content()).await
    }

    /// App serving `content` behind the gate
    pub async fn with_content(registry: MemoryRegistry, content: Router<AppState>) -> Self {
        let config = AppConfig::development();
        let clock = ManualClock::new(0);
        let aliases = AliasTable::new().with("/node/12", "/secret").with("/node/40", "/about");
        let sessions = MemorySessionStore::new(Arc::new(clock.clone()), config.session.idle_timeout_secs);
        let state = AppState::new(
            config.clone(),
            Arc::new(registry.clone()),
            Arc::new(aliases),
            Arc::new(sessions),
            Arc::new(clock.clone()),
        );

        Self {
            router: router(state, content),
            registry,
            clock,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.expect("router is infallible")
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, body: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap()).await
    }

    /// Bearer token carrying the given permissions
    pub fn token(&self, permissions: &[&str]) -> String {
        let claims = AdminClaims::new(
            "tester",
            permissions.iter().map(|p| p.to_string()).collect(),
            &self.config.security,
        );
        generate_jwt(&claims, &self.config.security).unwrap()
    }

    /// Submit the correct password for pid 7 and return the session cookie
    pub async fn unlock(&self) -> String {
        let response = self
            .post_form("/protected-page", &format!("protected_page=7&password={}&destination=%2Fsecret", PASSWORD), None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        session_cookie(&response).expect("unlock sets a session cookie")
    }
}

/// `name=value` pair of the Set-Cookie header, if any
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
