//! In-memory port doubles for orchestrator tests
//!
//! Both doubles count the writes they receive so tests can assert that a
//! call did or did not mutate state. The remote double can fail chosen
//! records, delay writes, and cancel a token on its first write.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use mindsync_core::config::SyncConfig;
use mindsync_core::domain::{MindMap, MindMapId, Node, NodeId, SyncableItem};
use mindsync_core::ports::{AccountStatus, ILocalRepository, IRemoteStore, RemoteStoreError};
use mindsync_core::schema::{Record, RecordMapping};
use mindsync_sync::SyncOrchestrator;

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// A mind map snapshot with a fixed id, version and update time
pub fn mind_map(id: MindMapId, title: &str, version: u64, updated: i64) -> MindMap {
    MindMap::with_id(id, title, at(0)).at_revision(version, at(updated))
}

/// Sync settings that keep tests fast
pub fn test_config() -> SyncConfig {
    SyncConfig {
        max_concurrent_entities: 4,
        max_retries: 2,
        retry_base_delay_ms: 1,
    }
}

pub fn setup() -> (
    Arc<InMemoryLocalRepository>,
    Arc<InMemoryRemoteStore>,
    SyncOrchestrator,
) {
    setup_with(test_config())
}

pub fn setup_with(
    config: SyncConfig,
) -> (
    Arc<InMemoryLocalRepository>,
    Arc<InMemoryRemoteStore>,
    SyncOrchestrator,
) {
    let local = Arc::new(InMemoryLocalRepository::default());
    let remote = Arc::new(InMemoryRemoteStore::default());
    let orchestrator = SyncOrchestrator::new(local.clone(), remote.clone(), &config);
    (local, remote, orchestrator)
}

// ============================================================================
// Local repository double
// ============================================================================

#[derive(Default)]
pub struct InMemoryLocalRepository {
    mind_maps: Mutex<BTreeMap<MindMapId, MindMap>>,
    nodes: Mutex<BTreeMap<NodeId, Node>>,
    saves: AtomicUsize,
}

impl InMemoryLocalRepository {
    /// Seeds a mind map without counting it as a write
    pub fn seed_mind_map(&self, map: MindMap) {
        self.mind_maps.lock().unwrap().insert(*map.id(), map);
    }

    pub fn seed_node(&self, node: Node) {
        self.nodes.lock().unwrap().insert(*node.id(), node);
    }

    pub fn mind_map(&self, id: &MindMapId) -> Option<MindMap> {
        self.mind_maps.lock().unwrap().get(id).cloned()
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.nodes.lock().unwrap().get(id).cloned()
    }

    pub fn mind_map_count(&self) -> usize {
        self.mind_maps.lock().unwrap().len()
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ILocalRepository for InMemoryLocalRepository {
    async fn load_mind_maps(&self) -> anyhow::Result<Vec<MindMap>> {
        Ok(self.mind_maps.lock().unwrap().values().cloned().collect())
    }

    async fn load_mind_map(&self, id: &MindMapId) -> anyhow::Result<Option<MindMap>> {
        Ok(self.mind_map(id))
    }

    async fn save_mind_map(&self, map: &MindMap) -> anyhow::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.mind_maps.lock().unwrap().insert(*map.id(), map.clone());
        Ok(())
    }

    async fn delete_mind_map(&self, id: &MindMapId) -> anyhow::Result<()> {
        self.mind_maps.lock().unwrap().remove(id);
        Ok(())
    }

    async fn load_nodes(&self, mind_map_id: &MindMapId) -> anyhow::Result<Vec<Node>> {
        Ok(self
            .nodes
            .lock()
            .unwrap()
            .values()
            .filter(|n| n.mind_map_id() == mind_map_id)
            .cloned()
            .collect())
    }

    async fn load_node(&self, id: &NodeId) -> anyhow::Result<Option<Node>> {
        Ok(self.node(id))
    }

    async fn save_node(&self, node: &Node) -> anyhow::Result<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.nodes.lock().unwrap().insert(*node.id(), node.clone());
        Ok(())
    }

    async fn delete_node(&self, id: &NodeId) -> anyhow::Result<()> {
        self.nodes.lock().unwrap().remove(id);
        Ok(())
    }
}

// ============================================================================
// Remote store double
// ============================================================================

pub struct InMemoryRemoteStore {
    records: Mutex<BTreeMap<(String, String), Record>>,
    status: Mutex<AccountStatus>,
    /// Record names whose saves fail with the given error
    failing: Mutex<HashMap<String, RemoteStoreError>>,
    /// Number of upcoming saves that fail with a transient error
    transient_failures: AtomicUsize,
    save_delay: Mutex<Option<Duration>>,
    listing_delay: Mutex<Option<Duration>>,
    cancel_on_save: Mutex<Option<CancellationToken>>,
    saves: AtomicUsize,
    status_checks: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            status: Mutex::new(AccountStatus::Available),
            failing: Mutex::new(HashMap::new()),
            transient_failures: AtomicUsize::new(0),
            save_delay: Mutex::new(None),
            listing_delay: Mutex::new(None),
            cancel_on_save: Mutex::new(None),
            saves: AtomicUsize::new(0),
            status_checks: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }
}

impl InMemoryRemoteStore {
    /// Seeds a record without counting it as a write
    pub fn seed(&self, record: Record) {
        self.records.lock().unwrap().insert(
            (record.record_type.clone(), record.record_name.clone()),
            record,
        );
    }

    pub fn seed_item<T: RecordMapping>(&self, item: &T) {
        self.seed(item.to_record());
    }

    pub fn record(&self, record_type: &str, record_name: &str) -> Option<Record> {
        self.records
            .lock()
            .unwrap()
            .get(&(record_type.to_string(), record_name.to_string()))
            .cloned()
    }

    pub fn mind_map(&self, id: &MindMapId) -> Option<MindMap> {
        self.record(MindMap::RECORD_TYPE, &id.to_string())
            .map(|r| MindMap::from_record(&r).unwrap())
    }

    pub fn node(&self, id: &NodeId) -> Option<Node> {
        self.record(Node::RECORD_TYPE, &id.to_string())
            .map(|r| Node::from_record(&r).unwrap())
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn set_account_status(&self, status: AccountStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn fail_saves_for(&self, record_name: impl Into<String>, error: RemoteStoreError) {
        self.failing.lock().unwrap().insert(record_name.into(), error);
    }

    pub fn fail_next_saves_transiently(&self, count: usize) {
        self.transient_failures.store(count, Ordering::SeqCst);
    }

    pub fn delay_saves(&self, delay: Duration) {
        *self.save_delay.lock().unwrap() = Some(delay);
    }

    /// Slows down `fetch_records` and `query_records`
    pub fn delay_listings(&self, delay: Duration) {
        *self.listing_delay.lock().unwrap() = Some(delay);
    }

    pub fn cancel_on_first_save(&self, token: CancellationToken) {
        *self.cancel_on_save.lock().unwrap() = Some(token);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn status_checks(&self) -> usize {
        self.status_checks.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn listing_pause(&self) {
        let delay = *self.listing_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn records_of(&self, record_type: &str) -> Vec<Record> {
        self.records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.record_type == record_type)
            .cloned()
            .collect()
    }
}

#[async_trait::async_trait]
impl IRemoteStore for InMemoryRemoteStore {
    async fn account_status(&self) -> anyhow::Result<AccountStatus> {
        self.status_checks.fetch_add(1, Ordering::SeqCst);
        Ok(*self.status.lock().unwrap())
    }

    async fn fetch_records(&self, record_type: &str) -> anyhow::Result<Vec<Record>> {
        self.listing_pause().await;
        Ok(self.records_of(record_type))
    }

    async fn query_records(
        &self,
        record_type: &str,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Record>> {
        self.listing_pause().await;
        let wanted = Value::String(value.to_string());
        Ok(self
            .records_of(record_type)
            .into_iter()
            .filter(|r| r.get(field) == Some(&wanted))
            .collect())
    }

    async fn fetch_record(
        &self,
        record_type: &str,
        record_name: &str,
    ) -> anyhow::Result<Option<Record>> {
        Ok(self.record(record_type, record_name))
    }

    async fn save_record(&self, record: &Record) -> anyhow::Result<()> {
        if let Some(error) = self.failing.lock().unwrap().get(&record.record_name) {
            return Err(anyhow::Error::new(error.clone()));
        }
        let pending = self.transient_failures.load(Ordering::SeqCst);
        if pending > 0 {
            self.transient_failures.store(pending - 1, Ordering::SeqCst);
            return Err(anyhow::Error::new(RemoteStoreError::Unavailable(
                "HTTP 503".into(),
            )));
        }

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let delay = *self.save_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.seed(record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if let Some(token) = self.cancel_on_save.lock().unwrap().take() {
            token.cancel();
        }
        Ok(())
    }

    async fn delete_record(&self, record_type: &str, record_name: &str) -> anyhow::Result<()> {
        self.records
            .lock()
            .unwrap()
            .remove(&(record_type.to_string(), record_name.to_string()));
        Ok(())
    }
}

/// Sorted ids of the given snapshots
pub fn ids_of<T: SyncableItem>(items: &[T]) -> Vec<T::Id> {
    let mut ids: Vec<T::Id> = items.iter().map(|i| i.id().clone()).collect();
    ids.sort();
    ids
}
