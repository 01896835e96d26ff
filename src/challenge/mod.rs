use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::database::manager::DatabaseError;
use crate::database::registry::ProtectedPathRegistry;
use crate::session::SessionUnlockTracker;
use crate::types::Pid;

/// Outcome of a password submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    Unlocked,
    Rejected,
}

/// Verifies submitted passwords and records unlocks on success
#[derive(Clone)]
pub struct ChallengeResolver {
    registry: Arc<dyn ProtectedPathRegistry>,
    unlock_ttl_secs: i64,
}

impl ChallengeResolver {
    pub fn new(registry: Arc<dyn ProtectedPathRegistry>, unlock_ttl_secs: i64) -> Self {
        Self {
            registry,
            unlock_ttl_secs,
        }
    }

    /// Unknown pids never verify
    pub async fn verify(&self, pid: Pid, supplied: &str) -> Result<bool, DatabaseError> {
        Ok(match self.registry.get(pid).await? {
            Some(record) => verify_password(supplied, &record.password),
            None => false,
        })
    }

    /// Verify and, on success, grant an unlock. A rejected password leaves
    /// the session untouched.
    pub async fn resolve(
        &self,
        pid: Pid,
        supplied: &str,
        tracker: &mut SessionUnlockTracker<'_>,
    ) -> Result<ChallengeOutcome, DatabaseError> {
        if self.verify(pid, supplied).await? {
            tracker.grant_unlock(pid, self.unlock_ttl_secs);
            info!("Unlocked protected page {} for {}s", pid, self.unlock_ttl_secs);
            Ok(ChallengeOutcome::Unlocked)
        } else {
            warn!("Rejected password for protected page {}", pid);
            Ok(ChallengeOutcome::Rejected)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::clock::ManualClock;
    use crate::database::registry::MemoryRegistry;
    use crate::session::Session;

    async fn resolver() -> ChallengeResolver {
        let registry = MemoryRegistry::new();
        registry.insert_with_pid(7, "/secret", &hash_password("opensesame")).await;
        ChallengeResolver::new(Arc::new(registry), 1800)
    }

    #[tokio::test]
    async fn correct_password_grants_unlock() {
        let resolver = resolver().await;
        let clock = ManualClock::new(50);
        let mut session = Session::new();
        let mut tracker = SessionUnlockTracker::new(&mut session, &clock);

        let outcome = resolver.resolve(7, "opensesame", &mut tracker).await.unwrap();
        assert_eq!(outcome, ChallengeOutcome::Unlocked);
        assert_eq!(tracker.record(7).map(|r| r.expire_time), Some(1850));
    }

    #[tokio::test]
    async fn wrong_password_does_not_touch_session() {
        let resolver = resolver().await;
        let clock = ManualClock::new(0);
        let mut session = Session::new();
        let mut tracker = SessionUnlockTracker::new(&mut session, &clock);

        let outcome = resolver.resolve(7, "nope", &mut tracker).await.unwrap();
        assert_eq!(outcome, ChallengeOutcome::Rejected);
        assert!(!session.is_modified());
    }

    #[tokio::test]
    async fn unknown_pid_never_verifies() {
        let resolver = resolver().await;
        assert!(!resolver.verify(99, "opensesame").await.unwrap());
        assert!(resolver.verify(7, "opensesame").await.unwrap());
    }
}
