//! Local repository port (driven/secondary port)
//!
//! CRUD over the entities held in local persistent storage.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because storage errors are adapter-specific
//!   (SQLite, in-memory, ...) and don't need domain-level classification.
//! - `save_*` stores the snapshot verbatim. Version and timestamp bumps
//!   happen in the domain mutators before the application saves; the sync
//!   engine relies on this to copy a remote winner without altering it.
//! - `delete_*` purges the row. Logical deletion is a tombstone snapshot
//!   saved through `save_*`.

use crate::domain::{MindMap, MindMapId, Node, NodeId};

/// Port trait for local entity storage
#[async_trait::async_trait]
pub trait ILocalRepository: Send + Sync {
    // --- MindMap operations ---

    /// Loads every mind map, tombstones included
    async fn load_mind_maps(&self) -> anyhow::Result<Vec<MindMap>>;

    /// Loads a mind map by id
    async fn load_mind_map(&self, id: &MindMapId) -> anyhow::Result<Option<MindMap>>;

    /// Saves a mind map (insert or replace)
    async fn save_mind_map(&self, map: &MindMap) -> anyhow::Result<()>;

    /// Purges a mind map
    async fn delete_mind_map(&self, id: &MindMapId) -> anyhow::Result<()>;

    // --- Node operations ---

    /// Loads every node belonging to the given mind map, tombstones included
    async fn load_nodes(&self, mind_map_id: &MindMapId) -> anyhow::Result<Vec<Node>>;

    /// Loads a node by id
    async fn load_node(&self, id: &NodeId) -> anyhow::Result<Option<Node>>;

    /// Saves a node (insert or replace)
    async fn save_node(&self, node: &Node) -> anyhow::Result<()>;

    /// Purges a node
    async fn delete_node(&self, id: &NodeId) -> anyhow::Result<()>;
}
