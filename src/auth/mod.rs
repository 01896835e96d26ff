pub mod password;

use axum::http::HeaderMap;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::SecurityConfig;

pub use password::{hash_password, verify_password};

/// Permission letting a caller skip the page gate entirely
pub const BYPASS_PERMISSION: &str = "bypass protected pages";

/// Permission required by the administrative API
pub const ADMIN_PERMISSION: &str = "administer protected pages";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminClaims {
    pub sub: String,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub exp: i64,
    pub iat: i64,
}

impl AdminClaims {
    pub fn new(sub: impl Into<String>, permissions: Vec<String>, security: &SecurityConfig) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(security.jwt_expiry_hours as i64)).timestamp();

        Self {
            sub: sub.into(),
            permissions,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingHeader,
    #[error("Authorization header must use Bearer token format")]
    InvalidHeader,
    #[error("JWT secret not configured")]
    InvalidSecret,
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
}

pub fn generate_jwt(claims: &AdminClaims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<AdminClaims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }
    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    decode::<AdminClaims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// Extract the bearer token from an Authorization header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_str = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(AuthError::MissingHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader)?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(AuthError::InvalidHeader),
    }
}

/// Claims from the request's bearer token, if any valid one is present
pub fn claims_from_headers(headers: &HeaderMap, security: &SecurityConfig) -> Result<AdminClaims, AuthError> {
    let token = bearer_token(headers)?;
    validate_jwt(token, security)
}

/// Whether the caller holds the gate bypass capability. Any token problem
/// counts as "no bypass".
pub fn caller_has_bypass_capability(headers: &HeaderMap, security: &SecurityConfig) -> bool {
    match claims_from_headers(headers, security) {
        Ok(claims) => claims.has_permission(BYPASS_PERMISSION),
        Err(AuthError::MissingHeader) => false,
        Err(e) => {
            tracing::debug!("Ignoring bearer token for bypass check: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn security() -> SecurityConfig {
        crate::config::AppConfig::development().security
    }

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn bypass_requires_permission() {
        let security = security();
        let with = AdminClaims::new("editor", vec![BYPASS_PERMISSION.to_string()], &security);
        let without = AdminClaims::new("viewer", vec![ADMIN_PERMISSION.to_string()], &security);

        let token = generate_jwt(&with, &security).unwrap();
        assert!(caller_has_bypass_capability(&headers_with(&token), &security));

        let token = generate_jwt(&without, &security).unwrap();
        assert!(!caller_has_bypass_capability(&headers_with(&token), &security));
    }

    #[test]
    fn bad_tokens_never_bypass() {
        let security = security();
        assert!(!caller_has_bypass_capability(&HeaderMap::new(), &security));
        assert!(!caller_has_bypass_capability(&headers_with("garbage"), &security));

        let mut other = security.clone();
        other.jwt_secret = "another-secret".to_string();
        let claims = AdminClaims::new("editor", vec![BYPASS_PERMISSION.to_string()], &other);
        let token = generate_jwt(&claims, &other).unwrap();
        assert!(!caller_has_bypass_capability(&headers_with(&token), &security));
    }

    #[test]
    fn empty_secret_is_rejected() {
        let mut security = security();
        security.jwt_secret.clear();
        let claims = AdminClaims::new("x", vec![], &security);
        assert!(matches!(generate_jwt(&claims, &security), Err(AuthError::InvalidSecret)));
    }
}
