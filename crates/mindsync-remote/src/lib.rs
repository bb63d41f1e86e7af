//! MindSync Remote - Backend record store client
//!
//! Provides an async client for the MindSync record API:
//! - Account status checks
//! - Record listing, field queries, fetch, save and delete
//! - Classification of HTTP failures into [`RemoteStoreError`](mindsync_core::ports::RemoteStoreError)
//!
//! ## Modules
//!
//! - [`client`] - Authenticated HTTP client and status classification
//! - [`store`] - `IRemoteStore` implementation on top of the client

pub mod client;
pub mod store;

pub use client::RemoteClient;
pub use store::HttpRemoteStore;
