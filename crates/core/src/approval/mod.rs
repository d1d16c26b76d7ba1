//! Budget application approval chain.
//!
//! This module implements the application lifecycle state machine: the
//! stage-advance table, the submit/approve/reject decisions, and the
//! derivations projected from approval lines.
//!
//! # Modules
//!
//! - `types` - Approval domain types (ApprovalStage, ApprovalAction, ...)
//! - `error` - Approval-specific error types
//! - `transition` - The stage-advance table and its default
//! - `service` - Pure action decisions and line projections

pub mod error;
pub mod service;
pub mod transition;
pub mod types;

#[cfg(test)]
mod service_props;

pub use error::ApprovalError;
pub use service::ApprovalService;
pub use transition::{ADVANCE_DEFAULT, ADVANCE_ON_APPROVE, advance_on_approve, entry_level};
pub use types::{
    ApplicationStatus, ApprovalAction, ApprovalLevel, ApprovalStage, LineResolution, LineSnapshot,
    LineStatus,
};
