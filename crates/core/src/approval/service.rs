//! Approval service for budget application stage transitions.
//!
//! This module implements the approval chain state machine. Each method
//! is a pure decision: given the current stage (and whether a pending
//! line exists), it returns the [`ApprovalAction`] the caller must apply
//! atomically to the application and its lines.

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::approval::transition::{advance_on_approve, entry_level};
use crate::approval::types::{
    ApprovalAction, ApprovalLevel, ApprovalStage, LineResolution, LineSnapshot, LineStatus,
};

/// Stateless service for budget application approval transitions.
///
/// All methods are associated functions. None of them touch storage:
/// repositories feed in the current state and persist the returned
/// action inside one transaction.
pub struct ApprovalService;

impl ApprovalService {
    /// Submit a draft application into the approval chain.
    ///
    /// Only a draft moves: it advances to the first level and a pending
    /// line at level "1" must be created. Submitting an application that
    /// is already past draft is a no-op, not an error, so the method
    /// returns `None` rather than failing.
    #[must_use]
    pub fn submit(current_stage: ApprovalStage) -> Option<ApprovalAction> {
        match current_stage {
            ApprovalStage::Draft => Some(ApprovalAction::Submit {
                stage: ApprovalStage::Level1,
                opens_level: ApprovalLevel::FIRST,
            }),
            _ => None,
        }
    }

    /// Approve the application at its current stage.
    ///
    /// With a pending line: the line resolves to approved (stamped with
    /// today's date) and the stage advances through the fixed table; a
    /// stage without a table entry lands on the default (approved). When
    /// the new stage is an intermediate level, the action carries the
    /// level of the next pending line to create.
    ///
    /// Without a pending line (redundant call, or a record with no
    /// approval history): the stage is forced straight to approved and no
    /// line is touched.
    #[must_use]
    pub fn approve(current_stage: ApprovalStage, has_pending_line: bool) -> ApprovalAction {
        if has_pending_line {
            let next = advance_on_approve(current_stage);
            ApprovalAction::Approve {
                stage: next,
                resolution: Some(LineResolution {
                    status: LineStatus::Approved,
                    approval_date: Self::today(),
                }),
                opens_level: entry_level(next),
            }
        } else {
            ApprovalAction::Approve {
                stage: ApprovalStage::Approved,
                resolution: None,
                opens_level: None,
            }
        }
    }

    /// Reject the application.
    ///
    /// The pending line (if any) resolves to rejected with today's date;
    /// the stage becomes rejected unconditionally, whether or not a line
    /// was pending.
    #[must_use]
    pub fn reject(has_pending_line: bool) -> ApprovalAction {
        let resolution = has_pending_line.then(|| LineResolution {
            status: LineStatus::Rejected,
            approval_date: Self::today(),
        });
        ApprovalAction::Reject {
            stage: ApprovalStage::Rejected,
            resolution,
        }
    }

    /// Projects the current approver from the approval line collection.
    ///
    /// The approver of the first pending line, or `None` when nothing is
    /// pending. No action ever assigns the approver itself, so this can
    /// legitimately be `None` even while a line is pending.
    #[must_use]
    pub fn current_approver(lines: &[LineSnapshot]) -> Option<Uuid> {
        lines
            .iter()
            .find(|line| line.status.is_pending())
            .and_then(|line| line.approver_id)
    }

    /// Counts pending lines in a collection (the chain keeps this at most one).
    #[must_use]
    pub fn pending_count(lines: &[LineSnapshot]) -> usize {
        lines.iter().filter(|line| line.status.is_pending()).count()
    }

    fn today() -> NaiveDate {
        Utc::now().date_naive()
    }
}
