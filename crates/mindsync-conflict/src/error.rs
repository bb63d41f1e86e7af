//! Error types for the conflict resolver

use thiserror::Error;

/// Errors that can occur while resolving a conflicting pair
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConflictError {
    /// The two snapshots do not describe the same entity
    #[error("cannot resolve snapshots of different entities (local {local}, remote {remote})")]
    IdMismatch { local: String, remote: String },
}
