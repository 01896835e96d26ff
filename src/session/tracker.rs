use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Session;
use crate::clock::Clock;
use crate::types::Pid;

/// Session key holding the per-pid unlock records
pub const UNLOCKS_KEY: &str = "protected_pages.unlocks";

/// Proof that the visitor supplied the password for a protected path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockRecord {
    pub request_time: i64,
    pub expire_time: i64,
}

impl UnlockRecord {
    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expire_time
    }
}

/// Per-session view of unlock records with lazy expiry.
///
/// Expired records are purged the moment a check observes them. Nothing
/// sweeps them in the background.
pub struct SessionUnlockTracker<'a> {
    session: &'a mut Session,
    clock: &'a dyn Clock,
}

impl<'a> SessionUnlockTracker<'a> {
    pub fn new(session: &'a mut Session, clock: &'a dyn Clock) -> Self {
        Self { session, clock }
    }

    pub fn is_unlocked(&mut self, pid: Pid) -> bool {
        let record = match self.record(pid) {
            Some(record) => record,
            None => return false,
        };
        if record.is_expired(self.clock.now()) {
            self.purge(pid);
            tracing::debug!("Unlock for protected page {} expired at {}", pid, record.expire_time);
            return false;
        }
        true
    }

    pub fn grant_unlock(&mut self, pid: Pid, ttl_seconds: i64) {
        let now = self.clock.now();
        let record = UnlockRecord {
            request_time: now,
            expire_time: now.saturating_add(ttl_seconds),
        };
        let mut unlocks = self.unlocks();
        match serde_json::to_value(record) {
            Ok(value) => {
                unlocks.insert(pid.to_string(), value);
            }
            Err(e) => {
                tracing::error!("Failed to encode unlock record for {}: {}", pid, e);
                return;
            }
        }
        self.session.insert(UNLOCKS_KEY, Value::Object(unlocks));
    }

    /// Current record for `pid`, expired or not. Malformed data reads as absent.
    pub fn record(&self, pid: Pid) -> Option<UnlockRecord> {
        let raw = self.session.get(UNLOCKS_KEY)?.as_object()?.get(&pid.to_string())?;
        serde_json::from_value(raw.clone()).ok()
    }

    fn purge(&mut self, pid: Pid) {
        let mut unlocks = self.unlocks();
        if unlocks.remove(&pid.to_string()).is_some() {
            self.session.insert(UNLOCKS_KEY, Value::Object(unlocks));
        }
    }

    fn unlocks(&self) -> Map<String, Value> {
        self.session
            .get(UNLOCKS_KEY)
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default()
    }
}
