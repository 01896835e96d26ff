// Administrative API for protected page records
//
// GET    /api/protected-pages          list (limit/offset)
// POST   /api/protected-pages          create { path, password }
// GET    /api/protected-pages/:pid     show
// PUT    /api/protected-pages/:pid     edit { path?, password? }
// DELETE /api/protected-pages/:pid     delete

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::app::AppState;
use crate::auth::{hash_password, AdminClaims};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::types::{Pagination, PathUpdate, Pid, ProtectedPath};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreatePage {
    pub path: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePage {
    pub path: Option<String>,
    pub password: Option<String>,
}

pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Vec<ProtectedPath>> {
    let page = Pagination::new(
        query.limit.unwrap_or(Pagination::DEFAULT_LIMIT),
        query.offset.unwrap_or(0),
    )
    .capped(state.config.registry.max_limit);

    Ok(ApiResponse::success(state.registry.list_all(page).await?))
}

pub async fn get_page(State(state): State<AppState>, Path(pid): Path<Pid>) -> ApiResult<ProtectedPath> {
    state
        .registry
        .get(pid)
        .await?
        .map(ApiResponse::success)
        .ok_or_else(|| ApiError::not_found(format!("Protected page {} not found", pid)))
}

pub async fn create_page(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Json(body): Json<CreatePage>,
) -> ApiResult<ProtectedPath> {
    let path = validate_path(&body.path)?;
    validate_password(&body.password)?;

    let password = hash_password(&body.password);
    let pid = state.registry.insert(&path, &password).await?;
    audit(&state, &claims, "created", pid, &path);

    Ok(ApiResponse::created(ProtectedPath { pid, path, password }))
}

pub async fn update_page(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(pid): Path<Pid>,
    Json(body): Json<UpdatePage>,
) -> ApiResult<ProtectedPath> {
    let update = PathUpdate {
        path: body.path.as_deref().map(validate_path).transpose()?,
        password: match body.password {
            Some(ref p) => {
                validate_password(p)?;
                Some(hash_password(p))
            }
            None => None,
        },
    };
    if update.is_empty() {
        return Err(ApiError::bad_request("Nothing to update: provide path and/or password"));
    }

    state.registry.update(pid, update).await?;
    let record = state
        .registry
        .get(pid)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Protected page {} not found", pid)))?;
    audit(&state, &claims, "updated", pid, &record.path);

    Ok(ApiResponse::success(record))
}

pub async fn delete_page(
    State(state): State<AppState>,
    Extension(claims): Extension<AdminClaims>,
    Path(pid): Path<Pid>,
) -> ApiResult<()> {
    state.registry.delete(pid).await?;
    audit(&state, &claims, "deleted", pid, "");
    Ok(ApiResponse::no_content())
}

/// Paths are stored lowercased, with surrounding slashes normalized
pub fn validate_path(raw: &str) -> Result<String, ApiError> {
    let raw = raw.trim();
    if !raw.starts_with('/') {
        return Err(ApiError::field_error("path", "Path must start with '/'"));
    }
    if raw.contains(['?', '#']) || raw.chars().any(char::is_whitespace) {
        return Err(ApiError::field_error("path", "Path must not contain a query, fragment or whitespace"));
    }
    Ok(crate::path::clean_path(raw).to_lowercase())
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.is_empty() {
        return Err(ApiError::field_error("password", "Password field is required"));
    }
    Ok(())
}

fn audit(state: &AppState, claims: &AdminClaims, action: &str, pid: Pid, path: &str) {
    if state.config.security.enable_audit_logging {
        tracing::info!(target: "audit", "{} {} protected page {} {}", claims.sub, action, pid, path);
    } else {
        tracing::info!("Protected page {} {}", pid, action);
    }
}
