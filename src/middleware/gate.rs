use axum::{
    extract::{Request, State},
    http::{header, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use super::session::SessionHandle;
use crate::app::AppState;
use crate::auth::caller_has_bypass_capability;
use crate::error::ApiError;
use crate::path::decode_request_path;
use crate::session::SessionUnlockTracker;
use crate::types::{Decision, Pid};

/// Runs once per request: loads the session, lets bypass holders and exempt
/// routes through, and otherwise asks the access gate for a decision.
///
/// Exemption and the gate both see the decoded path, so an escaped or
/// dotted spelling of a protected path is judged like the plain one.
pub async fn gate_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let path = match decode_request_path(request.uri().path()) {
        Some(path) => path,
        None => {
            tracing::debug!("Rejecting undecodable path {}", request.uri().path());
            return ApiError::bad_request("Malformed request path").into_response();
        }
    };

    let handle = SessionHandle::load(request.headers(), state.sessions.as_ref(), &state.config.session).await;
    request.extensions_mut().insert(handle.clone());

    let gated = !state.config.is_exempt(&path)
        && !caller_has_bypass_capability(request.headers(), &state.config.security);

    let decision = if gated {
        let mut session = handle.session.lock().await;
        let mut tracker = SessionUnlockTracker::new(&mut session, state.clock.as_ref());
        state.gate.check_request(&path, &mut tracker).await
    } else {
        Ok(Decision::Allow)
    };

    let mut response = match decision {
        Ok(Decision::Allow) => next.run(request).await,
        Ok(Decision::RedirectToChallenge(pid)) => {
            tracing::debug!("Redirecting {} to challenge for protected page {}", path, pid);
            Redirect::to(&challenge_location(&state.config.gate.challenge_route, pid, request.uri())).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    };

    if let Some(cookie) = handle.persist(state.sessions.as_ref(), &state.config.session).await {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    response
}

/// Challenge URL carrying the original destination and the pid
pub fn challenge_location(challenge_route: &str, pid: Pid, original: &Uri) -> String {
    let destination = original
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| original.path().to_string());
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("destination", &destination)
        .append_pair("protected_page", &pid.to_string())
        .finish();
    format!("{}?{}", challenge_route, query)
}
