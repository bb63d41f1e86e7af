//! Error taxonomy of the sync engine
//!
//! Adapters report failures as `anyhow::Error`. The orchestrator maps them
//! onto [`SyncError`] so callers get a typed reason per failed entity and
//! for aborted calls.

use thiserror::Error;

use mindsync_conflict::ConflictError;
use mindsync_core::ports::RemoteStoreError;
use mindsync_core::schema::SchemaError;

/// Errors that can occur during synchronization operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// No connectivity, or offline mode is engaged
    #[error("network unavailable")]
    NetworkUnavailable,

    /// No backend account is configured or the credentials were rejected
    #[error("sync account not found")]
    AccountNotFound,

    /// The account is not allowed to perform the operation
    #[error("permission denied")]
    PermissionDenied,

    /// The resolver could not produce a winner for a malformed pair
    #[error("conflict resolution failed")]
    ConflictResolutionFailed,

    /// A remote record could not be decoded
    #[error("data corrupted")]
    DataCorrupted,

    /// Storage or request quota exhausted
    #[error("quota exceeded")]
    QuotaExceeded,

    #[error("unknown error: {0}")]
    UnknownError(String),
}

impl SyncError {
    /// Maps a remote store failure onto the taxonomy
    ///
    /// Uses the [`RemoteStoreError`] attached by the adapter when there is
    /// one, and falls back to inspecting the message otherwise.
    pub fn from_remote_failure(err: &anyhow::Error) -> Self {
        let classified = err
            .chain()
            .find_map(|e| e.downcast_ref::<RemoteStoreError>());

        match classified {
            Some(remote) => Self::from(remote.clone()),
            None => classify_message(err),
        }
    }

    /// Maps a local repository failure onto the taxonomy
    pub fn from_local_failure(err: &anyhow::Error) -> Self {
        SyncError::UnknownError(format!("local repository: {err:#}"))
    }
}

impl From<RemoteStoreError> for SyncError {
    fn from(err: RemoteStoreError) -> Self {
        match err {
            RemoteStoreError::NotAuthenticated => SyncError::AccountNotFound,
            RemoteStoreError::Forbidden(_) => SyncError::PermissionDenied,
            RemoteStoreError::QuotaExceeded | RemoteStoreError::RateLimited => {
                SyncError::QuotaExceeded
            }
            RemoteStoreError::Unavailable(_) => SyncError::NetworkUnavailable,
            RemoteStoreError::MalformedRecord(_) => SyncError::DataCorrupted,
            RemoteStoreError::Other(msg) => SyncError::UnknownError(msg),
        }
    }
}

impl From<SchemaError> for SyncError {
    fn from(_: SchemaError) -> Self {
        SyncError::DataCorrupted
    }
}

impl From<ConflictError> for SyncError {
    fn from(_: ConflictError) -> Self {
        SyncError::ConflictResolutionFailed
    }
}

/// Best-effort classification of an untyped adapter error
fn classify_message(err: &anyhow::Error) -> SyncError {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    if lower.contains("network")
        || lower.contains("connection")
        || lower.contains("timeout")
        || lower.contains("dns")
        || lower.contains("offline")
    {
        return SyncError::NetworkUnavailable;
    }

    if lower.contains("401") || lower.contains("unauthorized") || lower.contains("no account") {
        return SyncError::AccountNotFound;
    }

    if lower.contains("403") || lower.contains("forbidden") || lower.contains("permission") {
        return SyncError::PermissionDenied;
    }

    if lower.contains("quota") || lower.contains("429") || lower.contains("rate limit") {
        return SyncError::QuotaExceeded;
    }

    SyncError::UnknownError(msg)
}
