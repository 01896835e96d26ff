pub mod store;
pub mod tracker;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use store::{MemorySessionStore, SessionError, SessionStore};
pub use tracker::{SessionUnlockTracker, UnlockRecord, UNLOCKS_KEY};

/// Opaque per-visitor key-value data.
///
/// Writes go through [`Session::insert`] and [`Session::remove`] so the
/// pipeline knows whether the session must be persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    values: Map<String, Value>,
    #[serde(skip)]
    modified: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
        self.modified = true;
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clear the modified flag after persisting
    pub fn mark_saved(&mut self) {
        self.modified = false;
    }
}

/// Random session identifier carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept only ids shaped like the ones we generate
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.len() == 32 && raw.chars().all(|c| c.is_ascii_hexdigit()) {
            Some(Self(raw.to_ascii_lowercase()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_tracks_modification() {
        let mut session = Session::new();
        assert!(!session.is_modified());
        assert!(session.remove("missing").is_none());
        assert!(!session.is_modified());

        session.insert("k", Value::from(1));
        assert!(session.is_modified());
        session.mark_saved();
        assert!(!session.is_modified());
        assert_eq!(session.get("k"), Some(&Value::from(1)));
    }

    #[test]
    fn session_ids_round_trip_through_parse() {
        let id = SessionId::generate();
        assert_eq!(SessionId::parse(id.as_str()), Some(id));
        assert!(SessionId::parse("short").is_none());
        assert!(SessionId::parse("zzzzzzzzzzzzzzzzzzzzzzzzzzzzzzzz").is_none());
    }
}
