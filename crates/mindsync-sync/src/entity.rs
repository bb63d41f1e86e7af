//! Per-type plumbing for synchronized entities
//!
//! The pairing algorithm is the same for mind maps and nodes; this trait
//! supplies the few operations that differ, namely which local repository
//! methods to call. Remote access goes through [`RecordMapping`].

use anyhow::Result;

use mindsync_core::domain::{MindMap, Node, SyncableItem};
use mindsync_core::ports::ILocalRepository;
use mindsync_core::schema::RecordMapping;

/// An entity the orchestrator knows how to load and store on both sides
#[async_trait::async_trait]
pub trait SyncEntity: SyncableItem + RecordMapping {
    /// Reads the current local snapshot with the given id
    async fn load_local(repo: &dyn ILocalRepository, id: &Self::Id) -> Result<Option<Self>>;

    /// Writes a snapshot to the local repository verbatim
    async fn save_local(repo: &dyn ILocalRepository, item: &Self) -> Result<()>;

    /// Parses a backend record name back into an id
    ///
    /// Record names are matched by value, so `None` means the name cannot
    /// belong to any entity of this type.
    fn parse_id(record_name: &str) -> Option<Self::Id>;
}

#[async_trait::async_trait]
impl SyncEntity for MindMap {
    async fn load_local(repo: &dyn ILocalRepository, id: &Self::Id) -> Result<Option<Self>> {
        repo.load_mind_map(id).await
    }

    async fn save_local(repo: &dyn ILocalRepository, item: &Self) -> Result<()> {
        repo.save_mind_map(item).await
    }

    fn parse_id(record_name: &str) -> Option<Self::Id> {
        record_name.parse().ok()
    }
}

#[async_trait::async_trait]
impl SyncEntity for Node {
    async fn load_local(repo: &dyn ILocalRepository, id: &Self::Id) -> Result<Option<Self>> {
        repo.load_node(id).await
    }

    async fn save_local(repo: &dyn ILocalRepository, item: &Self) -> Result<()> {
        repo.save_node(item).await
    }

    fn parse_id(record_name: &str) -> Option<Self::Id> {
        record_name.parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use mindsync_core::domain::{MindMapId, NodeId};

    use super::*;

    #[test]
    fn test_parse_id_ignores_case() {
        let id = MindMapId::new();
        assert_eq!(MindMap::parse_id(&id.to_string().to_uppercase()), Some(id));
    }

    #[test]
    fn test_parse_id_rejects_garbage() {
        assert_eq!(Node::parse_id("not-a-node"), None::<NodeId>);
    }
}
