//! Unit tests for the approval repository's pure helpers.
//!
//! The transactional paths are covered by the integration tests under
//! `tests/`; these tests pin the stored↔core enum conversions and the
//! snapshot projection the derived fields are computed from.

use chrono::Utc;
use uuid::Uuid;

use fundline_core::approval::{ApprovalService, LineStatus};

use crate::entities::{approval_lines, sea_orm_active_enums};
use crate::repositories::approval::{
    line_status_to_core, snapshots, stage_to_core, stage_to_db, status_to_db,
};

fn stored_line(status: sea_orm_active_enums::ApprovalLineStatus) -> approval_lines::Model {
    let now = Utc::now().into();
    approval_lines::Model {
        id: Uuid::new_v4(),
        budget_application_id: Uuid::new_v4(),
        level: "1".to_string(),
        status,
        approver_id: None,
        approval_date: None,
        comments: None,
        created_at: now,
        updated_at: now,
    }
}

#[test]
fn test_stage_conversion_roundtrip() {
    for stage in fundline_core::approval::ApprovalStage::ALL {
        assert_eq!(stage_to_core(stage_to_db(stage)), stage);
    }
}

#[test]
fn test_status_projection_maps_every_stage() {
    use sea_orm_active_enums::ApplicationStatus;

    for stage in fundline_core::approval::ApprovalStage::ALL {
        let stored = status_to_db(stage.status());
        match stage {
            fundline_core::approval::ApprovalStage::Approved => {
                assert_eq!(stored, ApplicationStatus::Approved);
            }
            fundline_core::approval::ApprovalStage::Rejected => {
                assert_eq!(stored, ApplicationStatus::Rejected);
            }
            _ => assert_eq!(stored, ApplicationStatus::Draft),
        }
    }
}

#[test]
fn test_line_status_conversion() {
    assert_eq!(
        line_status_to_core(sea_orm_active_enums::ApprovalLineStatus::Pending),
        LineStatus::Pending
    );
    assert_eq!(
        line_status_to_core(sea_orm_active_enums::ApprovalLineStatus::Approved),
        LineStatus::Approved
    );
    assert_eq!(
        line_status_to_core(sea_orm_active_enums::ApprovalLineStatus::Rejected),
        LineStatus::Rejected
    );
}

#[test]
fn test_snapshots_preserve_status_and_approver() {
    let approver = Uuid::new_v4();
    let mut pending = stored_line(sea_orm_active_enums::ApprovalLineStatus::Pending);
    pending.approver_id = Some(approver);
    let resolved = stored_line(sea_orm_active_enums::ApprovalLineStatus::Approved);

    let views = snapshots(&[resolved, pending]);
    assert_eq!(views.len(), 2);
    assert_eq!(views[0].status, LineStatus::Approved);
    assert_eq!(views[1].status, LineStatus::Pending);
    assert_eq!(views[1].approver_id, Some(approver));

    assert_eq!(ApprovalService::current_approver(&views), Some(approver));
}

#[test]
fn test_snapshots_of_unassigned_pending_line() {
    let pending = stored_line(sea_orm_active_enums::ApprovalLineStatus::Pending);
    let views = snapshots(&[pending]);

    // A pending line with no approver projects to no current approver.
    assert_eq!(ApprovalService::current_approver(&views), None);
    assert_eq!(ApprovalService::pending_count(&views), 1);
}
