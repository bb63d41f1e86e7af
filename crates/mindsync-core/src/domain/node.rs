//! Node entity
//!
//! A [`Node`] is one idea on the canvas of a mind map. Nodes form a tree
//! through `parent_id` / `child_ids`, can carry tags and media, and can be
//! turned into a task that is later completed.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;
use super::newtypes::{MediaId, MindMapId, NodeId, TagId};
use super::syncable::SyncableItem;

/// Canvas position of a node
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A single node of a mind map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    mind_map_id: MindMapId,
    text: String,
    position: Position,
    parent_id: Option<NodeId>,
    /// Ordered children, as laid out on the canvas
    child_ids: Vec<NodeId>,
    tag_ids: BTreeSet<TagId>,
    media_ids: BTreeSet<MediaId>,
    is_task: bool,
    is_completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    version: u64,
    deleted_at: Option<DateTime<Utc>>,
}

impl Node {
    /// Creates a new node in the given mind map at version 1
    pub fn new(mind_map_id: MindMapId, text: impl Into<String>, position: Position) -> Self {
        Self::with_id(NodeId::new(), mind_map_id, text, position, Utc::now())
    }

    /// Rebuilds a node with a known id and creation time, at version 1
    pub fn with_id(
        id: NodeId,
        mind_map_id: MindMapId,
        text: impl Into<String>,
        position: Position,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            mind_map_id,
            text: text.into(),
            position,
            parent_id: None,
            child_ids: Vec::new(),
            tag_ids: BTreeSet::new(),
            media_ids: BTreeSet::new(),
            is_task: false,
            is_completed: false,
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

    pub fn with_parent(mut self, parent_id: Option<NodeId>) -> Self {
        self.parent_id = parent_id;
        self
    }

    pub fn with_children(mut self, child_ids: impl IntoIterator<Item = NodeId>) -> Self {
        self.child_ids = child_ids.into_iter().collect();
        self
    }

    pub fn with_tags(mut self, tag_ids: impl IntoIterator<Item = TagId>) -> Self {
        self.tag_ids = tag_ids.into_iter().collect();
        self
    }

    pub fn with_media(mut self, media_ids: impl IntoIterator<Item = MediaId>) -> Self {
        self.media_ids = media_ids.into_iter().collect();
        self
    }

    pub fn with_task(mut self, is_task: bool, is_completed: bool) -> Self {
        self.is_task = is_task;
        self.is_completed = is_completed;
        self
    }

    pub fn with_deleted_at(mut self, deleted_at: Option<DateTime<Utc>>) -> Self {
        self.deleted_at = deleted_at;
        self
    }

    // --- Accessors ---

    pub fn mind_map_id(&self) -> &MindMapId {
        &self.mind_map_id
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.child_ids
    }

    pub fn tag_ids(&self) -> &BTreeSet<TagId> {
        &self.tag_ids
    }

    pub fn media_ids(&self) -> &BTreeSet<MediaId> {
        &self.media_ids
    }

    pub fn is_task(&self) -> bool {
        self.is_task
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
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

    pub fn set_text(&mut self, text: impl Into<String>) -> Result<(), DomainError> {
        self.ensure_live()?;
        self.text = text.into();
        self.touch();
        Ok(())
    }

    pub fn move_to(&mut self, position: Position) -> Result<(), DomainError> {
        self.ensure_live()?;
        self.position = position;
        self.touch();
        Ok(())
    }

    /// Re-parents the node. A node cannot be its own parent.
    pub fn set_parent(&mut self, parent_id: Option<NodeId>) -> Result<(), DomainError> {
        self.ensure_live()?;
        if parent_id == Some(self.id) {
            return Err(DomainError::SelfReference(self.id.to_string()));
        }
        self.parent_id = parent_id;
        self.touch();
        Ok(())
    }

    /// Appends a child. Returns false if it was already a child.
    pub fn add_child(&mut self, child_id: NodeId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        if child_id == self.id {
            return Err(DomainError::SelfReference(self.id.to_string()));
        }
        if self.child_ids.contains(&child_id) {
            return Ok(false);
        }
        self.child_ids.push(child_id);
        self.touch();
        Ok(true)
    }

    pub fn remove_child(&mut self, child_id: &NodeId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        let before = self.child_ids.len();
        self.child_ids.retain(|c| c != child_id);
        let removed = self.child_ids.len() != before;
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    pub fn add_tag(&mut self, tag_id: TagId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        let inserted = self.tag_ids.insert(tag_id);
        if inserted {
            self.touch();
        }
        Ok(inserted)
    }

    pub fn remove_tag(&mut self, tag_id: &TagId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        let removed = self.tag_ids.remove(tag_id);
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    pub fn attach_media(&mut self, media_id: MediaId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        let inserted = self.media_ids.insert(media_id);
        if inserted {
            self.touch();
        }
        Ok(inserted)
    }

    pub fn detach_media(&mut self, media_id: &MediaId) -> Result<bool, DomainError> {
        self.ensure_live()?;
        let removed = self.media_ids.remove(media_id);
        if removed {
            self.touch();
        }
        Ok(removed)
    }

    /// Turns the node into a task, or back into a plain node
    ///
    /// Clearing the task flag also clears completion.
    pub fn set_task(&mut self, is_task: bool) -> Result<(), DomainError> {
        self.ensure_live()?;
        self.is_task = is_task;
        if !is_task {
            self.is_completed = false;
        }
        self.touch();
        Ok(())
    }

    /// Marks the task as completed or reopened
    pub fn set_completed(&mut self, completed: bool) -> Result<(), DomainError> {
        self.ensure_live()?;
        if !self.is_task {
            return Err(DomainError::ValidationFailed(format!(
                "node {} is not a task",
                self.id
            )));
        }
        self.is_completed = completed;
        self.touch();
        Ok(())
    }

    /// Turns this snapshot into a tombstone. Deleting twice is a no-op.
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

impl SyncableItem for Node {
    type Id = NodeId;

    fn id(&self) -> &NodeId {
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
