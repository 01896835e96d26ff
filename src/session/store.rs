use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

use super::{Session, SessionId};
use crate::clock::Clock;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session store unavailable: {0}")]
    Unavailable(String),
}

/// Server-side storage of sessions keyed by the session cookie
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionError>;

    async fn save(&self, id: &SessionId, session: &Session) -> Result<(), SessionError>;

    /// Refresh the idle timer without replacing the stored contents
    async fn touch(&self, id: &SessionId) -> Result<(), SessionError>;

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError>;
}

struct StoredSession {
    session: Session,
    last_seen: i64,
}

/// In-process session store. Sessions idle for `idle_timeout_secs` are
/// dropped when next loaded, and every save sweeps out the idle ones.
#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, StoredSession>>>,
    clock: Arc<dyn Clock>,
    idle_timeout_secs: i64,
}

impl MemorySessionStore {
    pub fn new(clock: Arc<dyn Clock>, idle_timeout_secs: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            clock,
            idle_timeout_secs,
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<Session>, SessionError> {
        let now = self.clock.now();
        {
            let sessions = self.sessions.read().await;
            match sessions.get(id) {
                None => return Ok(None),
                Some(stored) if now - stored.last_seen < self.idle_timeout_secs => {
                    return Ok(Some(stored.session.clone()));
                }
                Some(_) => {}
            }
        }

        let mut sessions = self.sessions.write().await;
        sessions.remove(id);
        tracing::debug!("Dropped idle session {}", id);
        Ok(None)
    }

    async fn save(&self, id: &SessionId, session: &Session) -> Result<(), SessionError> {
        let now = self.clock.now();
        let mut stored = session.clone();
        stored.mark_saved();

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now - s.last_seen < self.idle_timeout_secs);
        if sessions.len() < before {
            tracing::debug!("Swept {} idle sessions", before - sessions.len());
        }
        sessions.insert(
            id.clone(),
            StoredSession {
                session: stored,
                last_seen: now,
            },
        );
        Ok(())
    }

    async fn touch(&self, id: &SessionId) -> Result<(), SessionError> {
        let now = self.clock.now();
        if let Some(stored) = self.sessions.write().await.get_mut(id) {
            stored.last_seen = now;
        }
        Ok(())
    }

    async fn destroy(&self, id: &SessionId) -> Result<(), SessionError> {
        self.sessions.write().await.remove(id);
        Ok(())
    }
}
