use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::database::manager::DatabaseError;
use crate::database::registry::ProtectedPathRegistry;
use crate::path::{NormalizedPath, PathNormalizer};
use crate::session::SessionUnlockTracker;
use crate::types::Decision;

#[derive(Debug, Error)]
pub enum GateError {
    /// The registry could not be consulted. Callers must not treat this as
    /// "not protected".
    #[error("Protected path lookup failed: {0}")]
    Lookup(#[from] DatabaseError),
}

/// Decides whether a request passes through or is sent to the challenge.
///
/// Bypass capability is checked by the caller before the gate runs.
#[derive(Clone)]
pub struct AccessGate {
    registry: Arc<dyn ProtectedPathRegistry>,
    normalizer: Arc<dyn PathNormalizer>,
}

impl AccessGate {
    pub fn new(registry: Arc<dyn ProtectedPathRegistry>, normalizer: Arc<dyn PathNormalizer>) -> Self {
        Self { registry, normalizer }
    }

    /// Evaluate one normalized path pair. A record matching either form is
    /// sufficient; the single record returned by the lookup decides.
    pub async fn evaluate(
        &self,
        alias: &str,
        canonical: &str,
        tracker: &mut SessionUnlockTracker<'_>,
    ) -> Result<Decision, GateError> {
        let record = self.registry.find_by_path_equals(canonical, alias).await?;
        let pid = match record {
            Some(record) => record.pid,
            None => return Ok(Decision::Allow),
        };

        if tracker.is_unlocked(pid) {
            debug!("Protected page {} unlocked for {}", pid, canonical);
            Ok(Decision::Allow)
        } else {
            debug!("Protected page {} locked for {} ({})", pid, canonical, alias);
            Ok(Decision::RedirectToChallenge(pid))
        }
    }

    /// Normalize `raw_path` and evaluate it, then evaluate the content entity
    /// behind the route when it has its own distinct path.
    pub async fn check_request(
        &self,
        raw_path: &str,
        tracker: &mut SessionUnlockTracker<'_>,
    ) -> Result<Decision, GateError> {
        let NormalizedPath { alias, canonical } = self.normalizer.normalize(raw_path);
        let decision = self.evaluate(&alias, &canonical, tracker).await?;
        if !decision.is_allow() {
            return Ok(decision);
        }

        let entity = match self.normalizer.entity_path(&canonical) {
            Some(entity) => entity,
            None => return Ok(decision),
        };
        let entity = self.normalizer.normalize(&entity);
        if entity.canonical == canonical {
            return Ok(decision);
        }

        debug!("Re-checking {} against entity path {}", canonical, entity.canonical);
        self.evaluate(&entity.alias, &entity.canonical, tracker).await
    }
}
