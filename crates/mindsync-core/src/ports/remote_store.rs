//! Remote store port (driven/secondary port)
//!
//! CRUD against the backend synchronization service, expressed in terms of
//! schema-mapped [`Record`]s. Record types and field names come from
//! [`crate::schema`].
//!
//! ## Design Notes
//!
//! - Methods return `anyhow::Result` like every other port. Adapters attach
//!   a [`RemoteStoreError`] to failures they can classify so the sync engine
//!   can recover the reason with `downcast_ref` and report a typed error.
//! - Authentication is owned by the adapter's caller; the port only reports
//!   the resulting account status.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::Record;

/// Availability of the backend account used for synchronization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    /// Signed in and allowed to sync
    Available,
    /// No backend account is configured on this device
    NoAccount,
    /// An account exists but is not allowed to sync
    Restricted,
}

/// Classified failures of a remote store operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteStoreError {
    /// The backend did not accept the credentials
    #[error("not authenticated with the sync service")]
    NotAuthenticated,

    /// The account may not perform this operation
    #[error("permission denied: {0}")]
    Forbidden(String),

    /// Storage quota exhausted
    #[error("storage quota exceeded")]
    QuotaExceeded,

    /// Too many requests; retry later
    #[error("rate limited by the sync service")]
    RateLimited,

    /// Connectivity failure or server-side error
    #[error("sync service unavailable: {0}")]
    Unavailable(String),

    /// The backend returned something that is not a valid record
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("{0}")]
    Other(String),
}

impl RemoteStoreError {
    /// Returns true if retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RemoteStoreError::RateLimited | RemoteStoreError::Unavailable(_)
        )
    }
}

/// Port trait for the backend record store
#[async_trait::async_trait]
pub trait IRemoteStore: Send + Sync {
    /// Reports whether the backend account can be used
    async fn account_status(&self) -> anyhow::Result<AccountStatus>;

    /// Fetches every record of the given type
    async fn fetch_records(&self, record_type: &str) -> anyhow::Result<Vec<Record>>;

    /// Fetches the records of a type whose `field` equals `value`
    async fn query_records(
        &self,
        record_type: &str,
        field: &str,
        value: &str,
    ) -> anyhow::Result<Vec<Record>>;

    /// Fetches one record, `None` if it does not exist
    async fn fetch_record(
        &self,
        record_type: &str,
        record_name: &str,
    ) -> anyhow::Result<Option<Record>>;

    /// Creates or replaces a record
    async fn save_record(&self, record: &Record) -> anyhow::Result<()>;

    /// Deletes a record; deleting a missing record succeeds
    async fn delete_record(&self, record_type: &str, record_name: &str) -> anyhow::Result<()>;
}
