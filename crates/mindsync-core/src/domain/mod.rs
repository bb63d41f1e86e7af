//! Domain entities and business logic
//!
//! This module contains the core domain types for MindSync:
//! - Newtypes for type-safe identifiers
//! - The `SyncableItem` capability shared by every synchronized entity
//! - Mind maps and their nodes
//! - Conflict resolution records
//! - Domain-specific error types

pub mod conflict;
pub mod errors;
pub mod mind_map;
pub mod newtypes;
pub mod node;
pub mod syncable;

// Re-export commonly used types
pub use conflict::{ConflictResolution, ResolutionStrategy};
pub use errors::DomainError;
pub use mind_map::MindMap;
pub use newtypes::*;
pub use node::{Node, Position};
pub use syncable::SyncableItem;
