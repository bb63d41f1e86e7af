//! MindSync Conflict - Conflict resolution
//!
//! Provides:
//! - Last-write-wins resolution over any [`SyncableItem`](mindsync_core::domain::SyncableItem)
//! - A total, argument-order independent tie-break for equal timestamps
//! - [`ConflictResolution`](mindsync_core::domain::ConflictResolution) records for the sync result

pub mod error;
pub mod resolver;

pub use error::ConflictError;
pub use resolver::ConflictResolver;
