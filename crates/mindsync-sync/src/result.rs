//! Outcome of a sync pass

use std::fmt;

use mindsync_core::domain::{ConflictResolution, MindMap, Node};

use crate::error::SyncError;

/// One entity that could not be synchronized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncFailure {
    /// Backend record type of the entity, e.g. `MindMap`
    pub record_type: String,
    pub entity_id: String,
    pub error: SyncError,
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.record_type, self.entity_id, self.error)
    }
}

/// Summary of a completed synchronization pass
///
/// Entities whose conflict was resolved appear both in the synced list
/// (with the winning snapshot) and in the conflict list.
#[derive(Debug, Clone, Default)]
pub struct SyncResult {
    /// Mind maps both sides now agree on
    pub synced_mind_maps: Vec<MindMap>,
    /// Nodes both sides now agree on
    pub synced_nodes: Vec<Node>,
    /// Mind map conflicts with both input snapshots and the winner
    pub mind_map_conflicts: Vec<ConflictResolution<MindMap>>,
    /// Node conflicts with both input snapshots and the winner
    pub node_conflicts: Vec<ConflictResolution<Node>>,
    /// Entities that failed; the rest of the pass went on without them
    pub errors: Vec<SyncFailure>,
    /// The pass was cancelled before every entity was processed
    pub cancelled: bool,
    /// Wall-clock duration of the pass in milliseconds
    pub duration_ms: u64,
}

impl SyncResult {
    pub fn synced_count(&self) -> usize {
        self.synced_mind_maps.len() + self.synced_nodes.len()
    }

    pub fn conflict_count(&self) -> usize {
        self.mind_map_conflicts.len() + self.node_conflicts.len()
    }

    /// True if nothing failed and the pass ran to completion
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty() && !self.cancelled
    }
}

/// Per-type outcome collected by the pairing loop
#[derive(Debug)]
pub(crate) struct PassOutcome<T> {
    pub synced: Vec<T>,
    pub conflicts: Vec<ConflictResolution<T>>,
    pub errors: Vec<SyncFailure>,
    pub cancelled: bool,
}

impl<T> Default for PassOutcome<T> {
    fn default() -> Self {
        Self {
            synced: Vec::new(),
            conflicts: Vec::new(),
            errors: Vec::new(),
            cancelled: false,
        }
    }
}

impl From<PassOutcome<MindMap>> for SyncResult {
    fn from(outcome: PassOutcome<MindMap>) -> Self {
        Self {
            synced_mind_maps: outcome.synced,
            mind_map_conflicts: outcome.conflicts,
            errors: outcome.errors,
            cancelled: outcome.cancelled,
            ..Default::default()
        }
    }
}

impl From<PassOutcome<Node>> for SyncResult {
    fn from(outcome: PassOutcome<Node>) -> Self {
        Self {
            synced_nodes: outcome.synced,
            node_conflicts: outcome.conflicts,
            errors: outcome.errors,
            cancelled: outcome.cancelled,
            ..Default::default()
        }
    }
}
