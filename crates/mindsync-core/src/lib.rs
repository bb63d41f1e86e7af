//! MindSync Core - Domain model and boundaries of the sync engine
//!
//! This crate contains the hexagonal core shared by every other crate:
//! - **Domain entities** - `MindMap`, `Node`, `ConflictResolution` and the
//!   [`SyncableItem`](domain::SyncableItem) capability
//! - **Schema mapper** - stable record types and field names of the backend
//! - **Port definitions** - `ILocalRepository`, `IRemoteStore`
//! - **Configuration** - YAML-backed settings for the engine and adapters
//!
//! # Architecture
//!
//! The domain module is pure: no I/O, no async. Ports define the trait
//! interfaces that adapter crates (`mindsync-cache`, `mindsync-remote`)
//! implement and that `mindsync-sync` consumes.

pub mod config;
pub mod domain;
pub mod ports;
pub mod schema;
