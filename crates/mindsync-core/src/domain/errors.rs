//! Domain error types
//!
//! Errors raised while constructing or mutating domain entities.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// ID parsing error
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// A node cannot be its own parent or child
    #[error("Node {0} cannot reference itself")]
    SelfReference(String),

    /// The entity was deleted and can no longer be edited
    #[error("Entity {0} has been deleted")]
    Deleted(String),

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DomainError::InvalidId("xyz".to_string());
        assert_eq!(err.to_string(), "Invalid ID format: xyz");

        let err = DomainError::Deleted("abc".to_string());
        assert_eq!(err.to_string(), "Entity abc has been deleted");
    }

    #[test]
    fn test_error_equality() {
        let err1 = DomainError::SelfReference("n1".to_string());
        let err2 = DomainError::SelfReference("n1".to_string());
        let err3 = DomainError::SelfReference("n2".to_string());

        assert_eq!(err1, err2);
        assert_ne!(err1, err3);
    }
}
