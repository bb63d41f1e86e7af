//! The capability shared by every synchronizable entity
//!
//! A [`SyncableItem`] exposes exactly what the conflict resolver and the
//! orchestrator need to pair and order two snapshots of the same entity:
//! an identifier, the time of the last mutation, and a version counter
//! that the owner bumps on every mutation.

use std::fmt::{Debug, Display};
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Capability contract for conflict-aware synchronization
///
/// ## Invariants
///
/// - `version()` strictly increases with each mutation of a given id.
/// - `last_modified()` never decreases while `version()` increases.
pub trait SyncableItem: Clone + Serialize + Send + Sync + 'static {
    /// Identifier type, stable across devices and the backend
    type Id: Clone + Eq + Hash + Ord + Display + Debug + Send + Sync + 'static;

    /// Returns the entity identifier
    fn id(&self) -> &Self::Id;

    /// Returns when the entity was last mutated (locally or remotely)
    fn last_modified(&self) -> DateTime<Utc>;

    /// Returns the mutation counter
    fn version(&self) -> u64;

    /// Returns true when this snapshot is a deletion tombstone
    fn is_tombstone(&self) -> bool {
        false
    }

    /// Returns true if both snapshots carry the same version and timestamp
    fn same_revision(&self, other: &Self) -> bool {
        self.version() == other.version() && self.last_modified() == other.last_modified()
    }

    /// SHA-256 digest of the serialized snapshot, hex encoded
    ///
    /// Two snapshots with equal fingerprints have identical content.
    fn fingerprint(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        Sha256::digest(&bytes)
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}
