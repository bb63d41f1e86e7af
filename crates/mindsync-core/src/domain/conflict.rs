//! Conflict resolution records
//!
//! When both copies of an entity changed since the last sync, the resolver
//! picks a winner and the orchestrator records the decision as a
//! [`ConflictResolution`], keeping both input snapshots for inspection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side's snapshot became authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    /// The local snapshot overwrote the remote one
    LocalWins,
    /// The remote snapshot overwrote the local one
    RemoteWins,
    /// Field-level merge. Reserved; the current resolver never produces it.
    Merge,
}

impl std::fmt::Display for ResolutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ResolutionStrategy::LocalWins => "local_wins",
            ResolutionStrategy::RemoteWins => "remote_wins",
            ResolutionStrategy::Merge => "merge",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of resolving one conflicting pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictResolution<T> {
    /// Local snapshot as it was before resolution
    pub local_item: T,
    /// Remote snapshot as it was before resolution
    pub remote_item: T,
    /// The snapshot both sides hold after resolution
    pub resolved_item: T,
    pub strategy: ResolutionStrategy,
    pub resolved_at: DateTime<Utc>,
}

impl<T> ConflictResolution<T> {
    pub fn new(local_item: T, remote_item: T, resolved_item: T, strategy: ResolutionStrategy) -> Self {
        Self {
            local_item,
            remote_item,
            resolved_item,
            strategy,
            resolved_at: Utc::now(),
        }
    }

    /// Returns true if the local copy has to be overwritten
    pub fn local_is_stale(&self) -> bool {
        self.strategy == ResolutionStrategy::RemoteWins
    }
}
