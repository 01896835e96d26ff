use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::auth::{claims_from_headers, AdminClaims, ADMIN_PERMISSION};
use crate::error::ApiError;

/// Requires a bearer token holding the admin permission and injects the
/// claims into the request
pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims: AdminClaims = claims_from_headers(request.headers(), &state.config.security)?;

    if !claims.has_permission(ADMIN_PERMISSION) {
        tracing::warn!("Admin API denied for '{}': missing permission", claims.sub);
        return Err(ApiError::forbidden(format!("Permission '{}' required", ADMIN_PERMISSION)));
    }

    tracing::debug!("Admin API access granted to '{}'", claims.sub);
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}
