pub mod admin;
pub mod challenge;

use axum::{
    extract::State,
    http::{StatusCode, Uri},
    response::{IntoResponse, Json},
};
use serde_json::{json, Value};

use crate::app::AppState;

pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Protected Pages (Rust)",
            "version": version,
            "description": "Shared-password access gate for web paths",
            "endpoints": {
                "challenge": "/protected-page (GET describe, POST submit password, DELETE end session)",
                "admin": "/api/protected-pages[/:pid] (requires admin token)",
                "health": "/health (public)",
            }
        }
    }))
}

/// Stand-in content for any path that made it through the gate
pub async fn content_page(uri: Uri) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": { "path": uri.path(), "content": "page content" }
    }))
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.registry.ping().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "registry": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "registry unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
