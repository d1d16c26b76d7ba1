//! Approval error types for the budget application lifecycle.
//!
//! This module defines all error types that can occur while applying
//! approval-chain actions or projecting approval state from storage.

use thiserror::Error;
use uuid::Uuid;

use crate::approval::types::LineStatus;

/// Errors that can occur during approval operations.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Budget application not found.
    #[error("Budget application {0} not found")]
    ApplicationNotFound(Uuid),

    /// Approval line not found.
    #[error("Approval line {0} not found")]
    LineNotFound(Uuid),

    /// Assigned approver does not exist.
    #[error("Approver {0} not found")]
    ApproverNotFound(Uuid),

    /// Attempted to modify an approval line that is no longer pending.
    #[error("Approval line {line_id} is already {status} and cannot be modified")]
    LineAlreadyResolved {
        /// The line that was targeted.
        line_id: Uuid,
        /// Its resolution status.
        status: LineStatus,
    },

    /// A stored stage string did not parse.
    #[error("Unknown approval stage: {0}")]
    UnknownStage(String),

    /// A stored line status string did not parse.
    #[error("Unknown approval line status: {0}")]
    UnknownLineStatus(String),

    /// A stored level label did not parse.
    #[error("Unknown approval level: {0}")]
    UnknownLevel(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),
}

impl ApprovalError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::LineAlreadyResolved { .. } => 409,
            Self::ApplicationNotFound(_) | Self::LineNotFound(_) | Self::ApproverNotFound(_) => {
                404
            }
            Self::UnknownStage(_)
            | Self::UnknownLineStatus(_)
            | Self::UnknownLevel(_)
            | Self::Database(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ApplicationNotFound(_) => "APPLICATION_NOT_FOUND",
            Self::LineNotFound(_) => "APPROVAL_LINE_NOT_FOUND",
            Self::ApproverNotFound(_) => "APPROVER_NOT_FOUND",
            Self::LineAlreadyResolved { .. } => "APPROVAL_LINE_ALREADY_RESOLVED",
            Self::UnknownStage(_) => "UNKNOWN_APPROVAL_STAGE",
            Self::UnknownLineStatus(_) => "UNKNOWN_APPROVAL_LINE_STATUS",
            Self::UnknownLevel(_) => "UNKNOWN_APPROVAL_LEVEL",
            Self::Database(_) => "DATABASE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_not_found_error() {
        let err = ApprovalError::ApplicationNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "APPLICATION_NOT_FOUND");
    }

    #[test]
    fn test_line_not_found_error() {
        let err = ApprovalError::LineNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "APPROVAL_LINE_NOT_FOUND");
    }

    #[test]
    fn test_approver_not_found_error() {
        let err = ApprovalError::ApproverNotFound(Uuid::nil());
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.error_code(), "APPROVER_NOT_FOUND");
    }

    #[test]
    fn test_line_already_resolved_error() {
        let err = ApprovalError::LineAlreadyResolved {
            line_id: Uuid::nil(),
            status: LineStatus::Approved,
        };
        assert_eq!(err.status_code(), 409);
        assert_eq!(err.error_code(), "APPROVAL_LINE_ALREADY_RESOLVED");
        assert!(err.to_string().contains("approved"));
    }

    #[test]
    fn test_unknown_stage_error() {
        let err = ApprovalError::UnknownStage("level_9".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "UNKNOWN_APPROVAL_STAGE");
        assert!(err.to_string().contains("level_9"));
    }

    #[test]
    fn test_database_error() {
        let err = ApprovalError::Database("connection lost".to_string());
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
