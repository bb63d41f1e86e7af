//! Sync orchestrator
//!
//! The [`SyncOrchestrator`] pairs local and remote snapshots by id and
//! makes both sides agree:
//!
//! 1. **Gate**: offline mode and account status are checked before any I/O
//! 2. **Listing**: local entities and remote records are loaded and paired
//! 3. **Per entity** (concurrently, one at a time per id):
//!    - local only: pushed to the remote store
//!    - remote only: saved to the local repository
//!    - both, same revision and content: left alone
//!    - both, diverged: resolved; the winner overwrites the stale side
//!
//! Per-entity failures are collected into the [`SyncResult`]; the pass goes
//! on with the remaining entities. Gate failures abort the call.
//!
//! ## Concurrency
//!
//! Work on the same entity id is serialized by a [`KeyedLock`], so a pass
//! and a concurrent [`SyncOrchestrator::sync_mind_map`] on the same id never
//! interleave their read, resolve and write steps. Inside the lock the local
//! snapshot is re-read, and the remote snapshot is re-fetched before any
//! push, so neither side is overwritten with an outdated winner.
//!
//! ## Cancellation
//!
//! [`SyncOrchestrator::cancel`] stops in-flight passes from starting new
//! entities. Every entity is settled by a single write to its stale side, so
//! it is either fully applied or untouched.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use futures_util::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use mindsync_conflict::ConflictResolver;
use mindsync_core::config::SyncConfig;
use mindsync_core::domain::{ConflictResolution, MindMap, MindMapId, Node, SyncableItem};
use mindsync_core::ports::{AccountStatus, ILocalRepository, IRemoteStore};
use mindsync_core::schema::{node_fields, record_types, Record, RecordMapping};

use crate::entity::SyncEntity;
use crate::error::SyncError;
use crate::gate::OfflineGate;
use crate::keyed_lock::KeyedLock;
use crate::result::{PassOutcome, SyncFailure, SyncResult};
use crate::retry::{with_retry, RetryPolicy};

// ============================================================================
// Planning
// ============================================================================

/// What has to happen to one entity to make both sides agree
#[derive(Debug)]
enum Plan<T> {
    /// Neither side has the entity any more
    Absent,
    /// Both sides already hold the same snapshot
    Unchanged(T),
    /// Only the local side has it
    Push(T),
    /// Only the remote side has it
    Pull(T),
    /// Both sides diverged
    Resolve(ConflictResolution<T>),
}

impl<T> Plan<T> {
    fn writes_remote(&self) -> bool {
        match self {
            Plan::Push(_) => true,
            Plan::Resolve(resolution) => !resolution.local_is_stale(),
            _ => false,
        }
    }

    fn writes_local(&self) -> bool {
        match self {
            Plan::Pull(_) => true,
            Plan::Resolve(resolution) => resolution.local_is_stale(),
            _ => false,
        }
    }
}

/// Same revision and same content
fn is_identical<T: SyncableItem>(a: &T, b: &T) -> bool {
    a.same_revision(b) && a.fingerprint() == b.fingerprint()
}

/// Per-entity result of a pass
enum PairOutcome<T> {
    Synced(T),
    Conflict(ConflictResolution<T>),
    Unchanged(T),
    Absent,
    Failed(SyncFailure),
    Cancelled,
}

// ============================================================================
// SyncOrchestrator
// ============================================================================

/// Entry point of the sync engine
pub struct SyncOrchestrator {
    local: Arc<dyn ILocalRepository>,
    remote: Arc<dyn IRemoteStore>,
    resolver: ConflictResolver,
    gate: Arc<OfflineGate>,
    locks: KeyedLock<(&'static str, String)>,
    retry: RetryPolicy,
    max_concurrent: usize,
    /// Token shared by the passes currently running
    cancel: Mutex<CancellationToken>,
}

impl SyncOrchestrator {
    /// Creates an orchestrator over the given repository and remote store
    pub fn new(
        local: Arc<dyn ILocalRepository>,
        remote: Arc<dyn IRemoteStore>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            local,
            remote,
            resolver: ConflictResolver::new(),
            gate: Arc::new(OfflineGate::new()),
            locks: KeyedLock::new(),
            retry: RetryPolicy::from(config),
            max_concurrent: config.max_concurrent_entities.max(1),
            cancel: Mutex::new(CancellationToken::new()),
        }
    }

    /// Uses a gate shared with other components instead of a private one
    pub fn with_gate(mut self, gate: Arc<OfflineGate>) -> Self {
        self.gate = gate;
        self
    }

    // --- Offline mode ---

    pub fn set_offline(&self, offline: bool) {
        self.gate.set_offline(offline);
    }

    pub fn is_offline(&self) -> bool {
        self.gate.is_offline()
    }

    pub fn gate(&self) -> &Arc<OfflineGate> {
        &self.gate
    }

    // --- Cancellation ---

    /// Cancels the passes currently in flight
    ///
    /// Entities already settled stay settled; the remaining ones are not
    /// started. Passes started afterwards are not affected.
    pub fn cancel(&self) {
        let token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        token.cancel();
        info!("Sync cancellation requested");
    }

    /// Token observed by the passes currently in flight
    pub fn cancellation_token(&self) -> CancellationToken {
        self.pass_token()
    }

    fn pass_token(&self) -> CancellationToken {
        let mut token = self.cancel.lock().unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
        token.clone()
    }

    // --- Public sync surface ---

    /// Synchronizes every mind map
    pub async fn sync_mind_maps(&self) -> Result<SyncResult, SyncError> {
        let started = Instant::now();
        let token = self.pass_token();
        self.ensure_reachable().await?;

        let local = self
            .local
            .load_mind_maps()
            .await
            .map_err(|e| SyncError::from_local_failure(&e))?;
        let remote = self
            .remote
            .fetch_records(record_types::MIND_MAP)
            .await
            .map_err(|e| SyncError::from_remote_failure(&e))?;

        let outcome = self.reconcile::<MindMap>(&token, local, remote).await;
        let mut result = SyncResult::from(outcome);
        result.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            synced = result.synced_mind_maps.len(),
            conflicts = result.mind_map_conflicts.len(),
            errors = result.errors.len(),
            cancelled = result.cancelled,
            duration_ms = result.duration_ms,
            "Mind map sync completed"
        );
        Ok(result)
    }

    /// Synchronizes a single mind map and returns the snapshot both sides hold
    ///
    /// The given snapshot competes with the repository copy before it meets
    /// the remote one, so a stale argument never overwrites newer local
    /// state. Every failure is returned as an error.
    pub async fn sync_mind_map(&self, mind_map: MindMap) -> Result<MindMap, SyncError> {
        self.ensure_reachable().await?;

        let id = *mind_map.id();
        let _guard = self.locks.lock((MindMap::RECORD_TYPE, id.to_string())).await;

        // The repository may hold a newer snapshot than the caller's
        let stored = MindMap::load_local(self.local.as_ref(), &id)
            .await
            .map_err(|e| SyncError::from_local_failure(&e))?;
        let local = match &stored {
            Some(stored) => self.resolver.resolve(stored, &mind_map),
            None => mind_map,
        };

        let remote = self.fetch_remote::<MindMap>(&id).await?;
        let plan = self.plan(Some(local), remote)?;
        let local_written = plan.writes_local();
        let settled = match self.apply(plan).await? {
            PairOutcome::Synced(item) | PairOutcome::Unchanged(item) => item,
            PairOutcome::Conflict(resolution) => resolution.resolved_item,
            // A local snapshot is always present, so the other outcomes
            // cannot come out of `apply` here.
            _ => return Err(SyncError::ConflictResolutionFailed),
        };

        let stored_current = stored.is_some_and(|s| is_identical(&s, &settled));
        if !local_written && !stored_current {
            self.save_local(&settled).await?;
        }

        debug!(
            mind_map_id = %settled.id(),
            version = settled.version(),
            "Mind map synchronized"
        );
        Ok(settled)
    }

    /// Synchronizes the nodes belonging to one mind map
    pub async fn sync_nodes(&self, mind_map_id: &MindMapId) -> Result<SyncResult, SyncError> {
        let started = Instant::now();
        let token = self.pass_token();
        self.ensure_reachable().await?;

        let local = self
            .local
            .load_nodes(mind_map_id)
            .await
            .map_err(|e| SyncError::from_local_failure(&e))?;
        let remote = self
            .remote
            .query_records(
                record_types::NODE,
                node_fields::MIND_MAP_ID,
                &mind_map_id.to_string(),
            )
            .await
            .map_err(|e| SyncError::from_remote_failure(&e))?;

        let outcome = self.reconcile::<Node>(&token, local, remote).await;
        let mut result = SyncResult::from(outcome);
        result.duration_ms = started.elapsed().as_millis() as u64;

        info!(
            mind_map_id = %mind_map_id,
            synced = result.synced_nodes.len(),
            conflicts = result.node_conflicts.len(),
            errors = result.errors.len(),
            cancelled = result.cancelled,
            duration_ms = result.duration_ms,
            "Node sync completed"
        );
        Ok(result)
    }

    /// Resolves one conflicting pair without touching either store
    pub fn handle_conflict<T: SyncableItem>(&self, local: &T, remote: &T) -> T {
        self.resolver.resolve(local, remote)
    }

    // --- Internals ---

    /// Gate-level checks shared by every entry point
    async fn ensure_reachable(&self) -> Result<(), SyncError> {
        self.gate.check()?;

        let status = self
            .remote
            .account_status()
            .await
            .map_err(|e| SyncError::from_remote_failure(&e))?;

        match status {
            AccountStatus::Available => Ok(()),
            AccountStatus::NoAccount => Err(SyncError::AccountNotFound),
            AccountStatus::Restricted => Err(SyncError::PermissionDenied),
        }
    }

    /// Pairs the listings by id and settles every pair
    async fn reconcile<T: SyncEntity>(
        &self,
        token: &CancellationToken,
        local: Vec<T>,
        remote: Vec<Record>,
    ) -> PassOutcome<T> {
        let mut outcome = PassOutcome::default();

        let mut pairs: BTreeMap<T::Id, Option<T>> = BTreeMap::new();
        for item in local {
            pairs.entry(item.id().clone()).or_default();
        }

        let mut corrupted: HashSet<T::Id> = HashSet::new();
        for record in remote {
            match T::from_record(&record) {
                Ok(item) => {
                    pairs.insert(item.id().clone(), Some(item));
                }
                Err(e) => {
                    warn!(
                        record_type = T::RECORD_TYPE,
                        record_name = %record.record_name,
                        error = %e,
                        "Skipping undecodable remote record"
                    );
                    outcome.errors.push(SyncFailure {
                        record_type: T::RECORD_TYPE.to_string(),
                        entity_id: record.record_name.clone(),
                        error: SyncError::from(e),
                    });
                    if let Some(id) = T::parse_id(&record.record_name) {
                        corrupted.insert(id);
                    }
                }
            }
        }

        // Never overwrite a record we could not read
        pairs.retain(|id, _| !corrupted.contains(id));
        if token.is_cancelled() {
            outcome.cancelled = true;
        }

        debug!(
            record_type = T::RECORD_TYPE,
            entities = pairs.len(),
            max_concurrent = self.max_concurrent,
            "Reconciling"
        );

        let results: Vec<PairOutcome<T>> = stream::iter(pairs)
            .map(|(id, remote)| async move { self.settle_pair(id, remote, token).await })
            .buffer_unordered(self.max_concurrent)
            .collect()
            .await;

        for result in results {
            match result {
                PairOutcome::Synced(item) => outcome.synced.push(item),
                PairOutcome::Conflict(resolution) => {
                    outcome.synced.push(resolution.resolved_item.clone());
                    outcome.conflicts.push(resolution);
                }
                PairOutcome::Unchanged(_) | PairOutcome::Absent => {}
                PairOutcome::Failed(failure) => outcome.errors.push(failure),
                PairOutcome::Cancelled => outcome.cancelled = true,
            }
        }

        outcome
    }

    /// Settles one entity of a pass under its lock
    async fn settle_pair<T: SyncEntity>(
        &self,
        id: T::Id,
        listed_remote: Option<T>,
        token: &CancellationToken,
    ) -> PairOutcome<T> {
        if token.is_cancelled() {
            return PairOutcome::Cancelled;
        }
        let _guard = self.locks.lock((T::RECORD_TYPE, id.to_string())).await;
        if token.is_cancelled() {
            return PairOutcome::Cancelled;
        }

        match self.settle_locked(&id, listed_remote).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(
                    record_type = T::RECORD_TYPE,
                    entity_id = %id,
                    error = %error,
                    "Entity sync failed"
                );
                PairOutcome::Failed(SyncFailure {
                    record_type: T::RECORD_TYPE.to_string(),
                    entity_id: id.to_string(),
                    error,
                })
            }
        }
    }

    async fn settle_locked<T: SyncEntity>(
        &self,
        id: &T::Id,
        listed_remote: Option<T>,
    ) -> Result<PairOutcome<T>, SyncError> {
        let local = T::load_local(self.local.as_ref(), id)
            .await
            .map_err(|e| SyncError::from_local_failure(&e))?;

        let mut plan = self.plan(local.clone(), listed_remote)?;
        if plan.writes_remote() {
            // The listing may predate a write made since; compare against
            // what the remote holds right now.
            let fresh = self.fetch_remote::<T>(id).await?;
            plan = self.plan(local, fresh)?;
        }

        self.apply(plan).await
    }

    fn plan<T: SyncableItem>(&self, local: Option<T>, remote: Option<T>) -> Result<Plan<T>, SyncError> {
        let plan = match (local, remote) {
            (None, None) => Plan::Absent,
            (Some(local), None) => Plan::Push(local),
            (None, Some(remote)) => Plan::Pull(remote),
            (Some(local), Some(remote)) => {
                if is_identical(&local, &remote) {
                    Plan::Unchanged(local)
                } else {
                    Plan::Resolve(self.resolver.try_resolve(local, remote)?)
                }
            }
        };
        Ok(plan)
    }

    async fn apply<T: SyncEntity>(&self, plan: Plan<T>) -> Result<PairOutcome<T>, SyncError> {
        match plan {
            Plan::Absent => Ok(PairOutcome::Absent),
            Plan::Unchanged(item) => {
                debug!(record_type = T::RECORD_TYPE, id = %item.id(), "Already in sync");
                Ok(PairOutcome::Unchanged(item))
            }
            Plan::Push(item) => {
                self.push(&item).await?;
                debug!(record_type = T::RECORD_TYPE, id = %item.id(), "Pushed local-only entity");
                Ok(PairOutcome::Synced(item))
            }
            Plan::Pull(item) => {
                self.save_local(&item).await?;
                debug!(record_type = T::RECORD_TYPE, id = %item.id(), "Pulled remote-only entity");
                Ok(PairOutcome::Synced(item))
            }
            Plan::Resolve(resolution) => {
                if resolution.local_is_stale() {
                    self.save_local(&resolution.resolved_item).await?;
                } else {
                    self.push(&resolution.resolved_item).await?;
                }
                info!(
                    record_type = T::RECORD_TYPE,
                    id = %resolution.resolved_item.id(),
                    strategy = %resolution.strategy,
                    "Conflict resolved"
                );
                Ok(PairOutcome::Conflict(resolution))
            }
        }
    }

    /// Fetches and decodes the current remote snapshot of one entity
    async fn fetch_remote<T: SyncEntity>(&self, id: &T::Id) -> Result<Option<T>, SyncError> {
        let name = id.to_string();
        let operation = format!("fetch {} {}", T::RECORD_TYPE, name);

        let record = with_retry(self.retry, &operation, || {
            self.remote.fetch_record(T::RECORD_TYPE, &name)
        })
        .await
        .map_err(|e| SyncError::from_remote_failure(&e))?;

        match record {
            Some(record) => Ok(Some(T::from_record(&record)?)),
            None => Ok(None),
        }
    }

    async fn push<T: SyncEntity>(&self, item: &T) -> Result<(), SyncError> {
        let record = item.to_record();
        let operation = format!("save {} {}", T::RECORD_TYPE, record.record_name);

        with_retry(self.retry, &operation, || self.remote.save_record(&record))
            .await
            .map_err(|e| SyncError::from_remote_failure(&e))
    }

    async fn save_local<T: SyncEntity>(&self, item: &T) -> Result<(), SyncError> {
        T::save_local(self.local.as_ref(), item)
            .await
            .map_err(|e| SyncError::from_local_failure(&e))
    }
}
