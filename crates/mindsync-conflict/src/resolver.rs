//! Last-write-wins conflict resolver
//!
//! Picks the authoritative snapshot of a conflicting pair. The order is
//! total, so two devices resolving the same pair always agree:
//!
//! 1. later `last_modified` wins
//! 2. on equal timestamps, higher `version` wins
//! 3. on equal versions, the greater content fingerprint wins
//!
//! Equal fingerprints mean identical content; the local snapshot is kept.
//! Resolution replaces the whole record; fields are never merged.

use std::cmp::Ordering;

use tracing::{debug, trace};

use mindsync_core::domain::{ConflictResolution, ResolutionStrategy, SyncableItem};

use crate::error::ConflictError;

/// Stateless resolver shared by every sync operation
#[derive(Debug, Default, Clone, Copy)]
pub struct ConflictResolver;

impl ConflictResolver {
    pub fn new() -> Self {
        Self
    }

    /// Decides which side of the pair is authoritative
    pub fn decide<T: SyncableItem>(&self, local: &T, remote: &T) -> ResolutionStrategy {
        let ordering = local
            .last_modified()
            .cmp(&remote.last_modified())
            .then_with(|| local.version().cmp(&remote.version()))
            .then_with(|| {
                trace!(id = %local.id(), "Equal revisions, comparing fingerprints");
                local.fingerprint().cmp(&remote.fingerprint())
            });

        match ordering {
            Ordering::Less => ResolutionStrategy::RemoteWins,
            Ordering::Greater | Ordering::Equal => ResolutionStrategy::LocalWins,
        }
    }

    /// Returns a copy of the winning snapshot; the inputs are left untouched
    pub fn resolve<T: SyncableItem>(&self, local: &T, remote: &T) -> T {
        match self.decide(local, remote) {
            ResolutionStrategy::RemoteWins => remote.clone(),
            _ => local.clone(),
        }
    }

    /// Resolves a pair and records the decision
    ///
    /// Fails only if the snapshots belong to different entities.
    pub fn try_resolve<T: SyncableItem>(
        &self,
        local: T,
        remote: T,
    ) -> Result<ConflictResolution<T>, ConflictError> {
        if local.id() != remote.id() {
            return Err(ConflictError::IdMismatch {
                local: local.id().to_string(),
                remote: remote.id().to_string(),
            });
        }

        let strategy = self.decide(&local, &remote);
        let resolved = match strategy {
            ResolutionStrategy::RemoteWins => remote.clone(),
            _ => local.clone(),
        };

        debug!(
            id = %local.id(),
            local_version = local.version(),
            remote_version = remote.version(),
            strategy = %strategy,
            "Conflict resolved"
        );

        Ok(ConflictResolution::new(local, remote, resolved, strategy))
    }
}
