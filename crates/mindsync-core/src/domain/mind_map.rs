//! Mind map entity
//!
//! A [`MindMap`] owns a set of node ids and optionally designates one of
//! them as the root. Every mutator bumps the version and the update
//! timestamp; the `with_*` constructors rebuild a snapshot verbatim from
//! storage or from the wire and never bump anything.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{MindMapId, NodeId};
use super::syncable::SyncableItem;

/// A mind map: a titled graph of nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MindMap {
    id: MindMapId,
    title: String,
    root_node_id: Option<NodeId>,
    node_ids: BTreeSet<NodeId>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    /// Set when the mind map was deleted; the snapshot is then a tombstone
    deleted_at: Option<DateTime<Utc>>,
}

impl MindMap {
    /// Creates a brand new mind map at version 1
    ///
    /// # Example
    ///
    /// ```
    /// use mindsync_core::domain::{MindMap, SyncableItem};
    ///
    /// let map = MindMap::new("Roadmap");
    /// assert_eq!(map.title(), "Roadmap");
    /// assert_eq!(map.version(), 1);
    /// assert!(map.node_ids().is_empty());
    /// ```
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_id(MindMapId::new(), title, Utc::now())
    }

    /// Rebuilds a mind map with a known id and creation time, at version 1
    pub fn with_id(id: MindMapId, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            root_node_id: None,
            node_ids: BTreeSet::new(),
            created_at,
            updated_at: created_at,
            version: 1,
            deleted_at: None,
        }
    }

    /// Sets the version and update time of a restored snapshot
    pub fn at_revision(mut self, version: u64, updated_at: DateTime<Utc>) -> Self {
        self.version = version;
        self.updated_at = updated_at;
        self
    }

    /// Sets the root node of a restored snapshot
    pub fn with_root_node(mut self, root_node_id: Option<NodeId>) -> Self {
        self.root_node_id = root_node_id;
        self
    }

    /// Sets the member nodes of a restored snapshot
    pub fn with_node_ids(mut self, node_ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.node_ids = node_ids.into_iter().collect();
        self
    }

    /// Sets the deletion time of a restored snapshot
    pub fn with_deleted_at(mut self, deleted_at: Option<DateTime<Utc>>) -> Self {
        self.deleted_at = deleted_at;
        self
    }

    // --- Accessors ---

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn root_node_id(&self) -> Option<&NodeId> {
        self.root_node_id.as_ref()
    }

    pub fn node_ids(&self) -> &BTreeSet<NodeId> {
        &self.node_ids
    }

    pub fn contains_node(&self, node_id: &NodeId) -> bool {
        self.node_ids.contains(node_id)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    // --- Mutators ---

    /// Renames the mind map
    pub fn set_title(&mut self, title: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_live()?;
        self.title = title.into();
        self.touch();
        Ok(())
    }

    /// Designates the root node, adding it to the member set if needed
    pub fn set_root_node(&mut self, root_node_id: Option<NodeId>) -> Result<(), DomainError> {
        self.ensure_live()?;
        if let Some(root) = root_node_id {
            self.node_ids.insert(root);
        }
        self.root_node_id = root_node_id;
        self.touch();
        Ok(())
    }

    /// Adds a node to the map. Returns false if it was already a member.
    pub fn add_node(&mut self, node_id: NodeId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        let inserted = self.node_ids.insert(node_id);
        if inserted {
            self.touch();
        }
        Ok(inserted)
    }

    /// Removes a node from the map, clearing the root if it pointed there
    pub fn remove_node(&mut self, node_id: &NodeId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        let removed = self.node_ids.remove(node_id);
        if removed {
            if self.root_node_id.as_ref() == Some(node_id) {
                self.root_node_id = None;
            }
            self.touch();
        }
        Ok(removed)
    }

    /// Turns this snapshot into a tombstone
    ///
    /// Deleting is a mutation like any other, so the tombstone outranks
    /// older edits during conflict resolution. Deleting twice is a no-op.
    pub fn mark_deleted(&mut self) {
        if self.deleted_at.is_some() {
            return;
        }
        self.touch();
        self.deleted_at = Some(self.updated_at);
    }

    fn ensure_live(&self) -> Result<(), DomainError> {
        if self.is_deleted() {
            return Err(DomainError::Deleted(self.id.to_string()));
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.version += 1;
        self.updated_at = self.updated_at.max(Utc::now());
    }
}

impl SyncableItem for MindMap {
    type Id = MindMapId;

    fn id(&self) -> &MindMapId {
        &self.id
    }

    fn last_modified(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn is_tombstone(&self) -> bool {
        self.is_deleted()
    }
}
