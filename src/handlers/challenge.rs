// Password challenge for locked pages
//
// GET    shows what the challenge form needs to submit.
// POST   verifies the password and sends the visitor back to where they were.
// DELETE ends the visitor's session, locking every page again.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Extension, Form,
};
use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::challenge::ChallengeOutcome;
use crate::error::ApiError;
use crate::middleware::{expired_session_cookie, ApiResponse, ApiResult, SessionHandle};
use crate::session::{Session, SessionUnlockTracker};
use crate::types::Pid;

#[derive(Debug, Deserialize)]
pub struct ChallengeQuery {
    pub protected_page: Option<Pid>,
    pub destination: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChallengeForm {
    pub protected_page: Option<Pid>,
    pub password: Option<String>,
    pub destination: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChallengeDescription {
    pub protected_page: Pid,
    pub destination: String,
    pub action: String,
    pub method: &'static str,
    pub fields: Vec<&'static str>,
}

pub async fn challenge_get(
    State(state): State<AppState>,
    Query(query): Query<ChallengeQuery>,
) -> ApiResult<ChallengeDescription> {
    let pid = query
        .protected_page
        .ok_or_else(|| ApiError::bad_request("Missing protected_page parameter"))?;

    if state.registry.get(pid).await?.is_none() {
        return Err(ApiError::not_found(format!("Protected page {} not found", pid)));
    }

    Ok(ApiResponse::success(ChallengeDescription {
        protected_page: pid,
        destination: safe_destination(query.destination.as_deref()),
        action: state.config.gate.challenge_route.clone(),
        method: "POST",
        fields: vec!["protected_page", "password", "destination"],
    }))
}

pub async fn challenge_post(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
    Form(form): Form<ChallengeForm>,
) -> Result<Response, ApiError> {
    let pid = form
        .protected_page
        .ok_or_else(|| ApiError::field_error("protected_page", "This field is required"))?;
    let password = form
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::field_error("password", "Password field is required"))?;

    let outcome = {
        let mut session = handle.session.lock().await;
        let mut tracker = SessionUnlockTracker::new(&mut session, state.clock.as_ref());
        state.challenge.resolve(pid, &password, &mut tracker).await?
    };

    match outcome {
        ChallengeOutcome::Unlocked => {
            if state.config.security.enable_audit_logging {
                tracing::info!(target: "audit", "session {} unlocked protected page {}", handle.id, pid);
            }
            Ok(Redirect::to(&safe_destination(form.destination.as_deref())).into_response())
        }
        ChallengeOutcome::Rejected => Err(ApiError::unauthorized("Incorrect password!")),
    }
}

pub async fn challenge_delete(
    State(state): State<AppState>,
    Extension(handle): Extension<SessionHandle>,
) -> Result<Response, ApiError> {
    state.sessions.destroy(&handle.id).await?;
    *handle.session.lock().await = Session::new();
    tracing::debug!("Session {} ended", handle.id);

    let mut response = StatusCode::NO_CONTENT.into_response();
    if let Some(cookie) = expired_session_cookie(&state.config.session) {
        response.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Only same-site absolute paths are followed; anything else returns home
pub fn safe_destination(destination: Option<&str>) -> String {
    match destination.map(str::trim) {
        Some(d) if d.starts_with('/') && !d.starts_with("//") && !d.contains('\\') && !d.contains("://") => {
            d.to_string()
        }
        _ => "/".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_must_be_local() {
        assert_eq!(safe_destination(Some("/secret?tab=2")), "/secret?tab=2");
        assert_eq!(safe_destination(Some("//evil.example")), "/");
        assert_eq!(safe_destination(Some("https://evil.example/")), "/");
        assert_eq!(safe_destination(Some("/\\evil.example")), "/");
        assert_eq!(safe_destination(Some("relative")), "/");
        assert_eq!(safe_destination(None), "/");
    }
}
