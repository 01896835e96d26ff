/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Identifier of a protected path record
pub type Pid = i64;

/// A registered path requiring a shared password before content is served.
/// `password` holds the stored hash, never the plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ProtectedPath {
    pub pid: Pid,
    pub path: String,
    #[serde(skip_serializing)]
    pub password: String,
}

/// Outcome of evaluating a request path against the registry and session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", content = "pid", rename_all = "snake_case")]
pub enum Decision {
    Allow,
    RedirectToChallenge(Pid),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Partial replacement of a protected path record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathUpdate {
    pub path: Option<String>,
    pub password: Option<String>,
}

impl PathUpdate {
    pub fn is_empty(&self) -> bool {
        self.path.is_none() && self.password.is_none()
    }
}

/// Page window for listing records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 50;

    pub fn new(limit: i64, offset: i64) -> Self {
        Self { limit, offset }
    }

    /// Clamp to non-negative values with `limit` capped at `max_limit`
    pub fn capped(self, max_limit: i64) -> Self {
        let limit = self.limit.clamp(0, max_limit.max(0));
        if limit < self.limit {
            tracing::warn!("Limit {} exceeds max {}, capping to max", self.limit, max_limit);
        }
        Self {
            limit,
            offset: self.offset.max(0),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_caps_limit_and_clamps_offset() {
        let page = Pagination::new(5000, -3).capped(100);
        assert_eq!(page, Pagination::new(100, 0));
        assert_eq!(Pagination::new(10, 20).capped(100), Pagination::new(10, 20));
    }

    #[test]
    fn decision_serializes_with_pid() {
        let json = serde_json::to_value(Decision::RedirectToChallenge(7)).unwrap();
        assert_eq!(json, serde_json::json!({ "decision": "redirect_to_challenge", "pid": 7 }));
    }

    #[test]
    fn protected_path_never_serializes_hash() {
        let page = ProtectedPath { pid: 1, path: "/secret".into(), password: "sha256$x$y".into() };
        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("password").is_none());
    }
}
