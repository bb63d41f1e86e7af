//! MindSync Sync - Conflict-aware synchronization engine
//!
//! Provides:
//! - Offline gating of every network-bound operation
//! - Pairing of local and remote snapshots by id with last-write-wins resolution
//! - Per-entity serialization through a keyed lock
//! - Partial-failure reporting and cancellation of in-flight passes
//!
//! ## Modules
//!
//! - [`orchestrator`] - The [`SyncOrchestrator`] public surface
//! - [`gate`] - Offline flag consulted before any I/O
//! - [`keyed_lock`] - One async mutex per entity id
//! - [`retry`] - Exponential backoff for transient remote failures
//! - [`entity`] - Per-type plumbing between the ports and the schema mapper
//! - [`result`] - [`SyncResult`] and per-entity failures
//! - [`logging`] - tracing subscriber setup

pub mod entity;
pub mod error;
pub mod gate;
pub mod keyed_lock;
pub mod logging;
pub mod orchestrator;
pub mod result;
pub mod retry;

pub use error::SyncError;
pub use gate::OfflineGate;
pub use orchestrator::SyncOrchestrator;
pub use result::{SyncFailure, SyncResult};
