//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the sync engine depends on, implemented by
//! adapter crates.
//!
//! ## Ports Overview
//!
//! - [`ILocalRepository`] - Local persistent storage of mind maps and nodes
//! - [`IRemoteStore`] - Backend record store, addressed through the schema mapper

pub mod local_repository;
pub mod remote_store;

pub use local_repository::ILocalRepository;
pub use remote_store::{AccountStatus, IRemoteStore, RemoteStoreError};
