//! SQLite implementation of ILocalRepository
//!
//! Each entity is stored as a JSON payload next to the columns the store
//! filters or orders on. Saves are upserts that keep the snapshot exactly
//! as given; versions and timestamps are owned by the domain.
//!
//! ## Type Mapping
//!
//! | Domain Type          | SQL Type | Strategy                                   |
//! |----------------------|----------|--------------------------------------------|
//! | MindMapId, NodeId    | TEXT     | UUID string via `.to_string()`             |
//! | version (u64)        | INTEGER  | `i64::try_from`                            |
//! | DateTime<Utc>        | TEXT     | RFC 3339, UTC, `Z` suffix                  |
//! | MindMap, Node        | TEXT     | serde_json serialization of the snapshot   |

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use mindsync_core::domain::{MindMap, MindMapId, Node, NodeId, SyncableItem};
use mindsync_core::ports::ILocalRepository;

use crate::CacheError;

/// SQLite-based implementation of the local repository port
pub struct SqliteLocalRepository {
    pool: SqlitePool,
}

impl SqliteLocalRepository {
    /// Creates a new repository instance with the given connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Helper functions for type conversion
// ============================================================================

fn timestamp_to_string(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn version_to_i64(version: u64) -> Result<i64, CacheError> {
    i64::try_from(version)
        .map_err(|_| CacheError::SerializationError(format!("version {} out of range", version)))
}

fn mind_map_from_row(row: &SqliteRow) -> Result<MindMap, CacheError> {
    let payload: String = row.try_get("payload")?;
    Ok(serde_json::from_str(&payload)?)
}

fn node_from_row(row: &SqliteRow) -> Result<Node, CacheError> {
    let payload: String = row.try_get("payload")?;
    Ok(serde_json::from_str(&payload)?)
}

// ============================================================================
// ILocalRepository implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalRepository for SqliteLocalRepository {
    // --- Mind maps ---

    async fn load_mind_maps(&self) -> anyhow::Result<Vec<MindMap>> {
        let rows = sqlx::query("SELECT payload FROM mind_maps ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        let maps = rows
            .iter()
            .map(mind_map_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(maps)
    }

    async fn load_mind_map(&self, id: &MindMapId) -> anyhow::Result<Option<MindMap>> {
        let row = sqlx::query("SELECT payload FROM mind_maps WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(mind_map_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn save_mind_map(&self, mind_map: &MindMap) -> anyhow::Result<()> {
        let id = mind_map.id().to_string();
        let version = version_to_i64(mind_map.version())?;
        let updated_at = timestamp_to_string(mind_map.updated_at());
        let deleted_at = mind_map.deleted_at().map(timestamp_to_string);
        let payload = serde_json::to_string(mind_map)
            .map_err(|e| anyhow::anyhow!("Failed to serialize mind map: {}", e))?;

        sqlx::query(
            "INSERT INTO mind_maps (id, version, updated_at, deleted_at, payload) \
             VALUES (?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             version = excluded.version, updated_at = excluded.updated_at, \
             deleted_at = excluded.deleted_at, payload = excluded.payload",
        )
        .bind(&id)
        .bind(version)
        .bind(&updated_at)
        .bind(&deleted_at)
        .bind(&payload)
        .execute(&self.pool)
        .await?;

        tracing::trace!(mind_map_id = %id, version, "Saved mind map");
        Ok(())
    }

    async fn delete_mind_map(&self, id: &MindMapId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM mind_maps WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::trace!(mind_map_id = %id, "Deleted mind map");
        Ok(())
    }

    // --- Nodes ---

    async fn load_nodes(&self, mind_map_id: &MindMapId) -> anyhow::Result<Vec<Node>> {
        let rows = sqlx::query("SELECT payload FROM nodes WHERE mind_map_id = ? ORDER BY id")
            .bind(mind_map_id.to_string())
            .fetch_all(&self.pool)
            .await?;

        let nodes = rows
            .iter()
            .map(node_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(nodes)
    }

    async fn load_node(&self, id: &NodeId) -> anyhow::Result<Option<Node>> {
        let row = sqlx::query("SELECT payload FROM nodes WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(ref r) => Ok(Some(node_from_row(r)?)),
            None => Ok(None),
        }
    }

    async fn save_node(&self, node: &Node) -> anyhow::Result<()> {
        let id = node.id().to_string();
        let mind_map_id = node.mind_map_id().to_string();
        let version = version_to_i64(node.version())?;
        let updated_at = timestamp_to_string(node.updated_at());
        let deleted_at = node.deleted_at().map(timestamp_to_string);
        let payload = serde_json::to_string(node)
            .map_err(|e| anyhow::anyhow!("Failed to serialize node: {}", e))?;

        sqlx::query(
            "INSERT INTO nodes (id, mind_map_id, version, updated_at, deleted_at, payload) \
             VALUES (?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET \
             mind_map_id = excluded.mind_map_id, version = excluded.version, \
             updated_at = excluded.updated_at, deleted_at = excluded.deleted_at, \
             payload = excluded.payload",
        )
        .bind(&id)
        .bind(&mind_map_id)
        .bind(version)
        .bind(&updated_at)
        .bind(&deleted_at)
        .bind(&payload)
        .execute(&self.pool)
        .await?;

        tracing::trace!(node_id = %id, mind_map_id = %mind_map_id, version, "Saved node");
        Ok(())
    }

    async fn delete_node(&self, id: &NodeId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        tracing::trace!(node_id = %id, "Deleted node");
        Ok(())
    }
}
