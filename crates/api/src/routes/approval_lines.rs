//! Approval line routes.
//!
//! The chain creates and resolves lines on its own; the only mutation
//! exposed here is the manual path the chain never takes, assigning an
//! approver (or editing comments) on a line that is still pending.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use fundline_db::entities::{approval_lines, sea_orm_active_enums::ApprovalLineStatus};
use fundline_db::repositories::{ApprovalRepository, UpdateApprovalLineInput};

use super::applications::map_approval_error;

/// Creates the approval line routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/applications/{app_id}/approvals",
            get(list_approval_lines),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/approvals/{line_id}",
            patch(update_approval_line),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for updating a pending approval line.
#[derive(Debug, Deserialize)]
pub struct UpdateApprovalLineRequest {
    /// Approver to assign.
    pub approver_id: Option<Uuid>,
    /// Comments to record.
    pub comments: Option<String>,
}

/// Response for an approval line.
#[derive(Debug, Serialize)]
pub struct ApprovalLineResponse {
    /// Line ID.
    pub id: Uuid,
    /// Owning application.
    pub budget_application_id: Uuid,
    /// Level label ("1", "2", "3").
    pub level: String,
    /// Resolution status.
    pub status: String,
    /// Assigned approver, if any.
    pub approver_id: Option<Uuid>,
    /// Date the line was resolved, if it is.
    pub approval_date: Option<NaiveDate>,
    /// Comments recorded on the line.
    pub comments: Option<String>,
    /// Created at timestamp.
    pub created_at: String,
}

impl From<approval_lines::Model> for ApprovalLineResponse {
    fn from(line: approval_lines::Model) -> Self {
        Self {
            id: line.id,
            budget_application_id: line.budget_application_id,
            level: line.level,
            status: line_status_to_string(line.status),
            approver_id: line.approver_id,
            approval_date: line.approval_date,
            comments: line.comments,
            created_at: line.created_at.to_rfc3339(),
        }
    }
}

/// Renders the stored line status as its API label.
fn line_status_to_string(status: ApprovalLineStatus) -> String {
    match status {
        ApprovalLineStatus::Pending => "pending",
        ApprovalLineStatus::Approved => "approved",
        ApprovalLineStatus::Rejected => "rejected",
    }
    .to_string()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/organizations/{org_id}/applications/{app_id}/approvals` - List the
/// approval audit trail in creation order.
async fn list_approval_lines(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ApprovalRepository::new((*state.db).clone());
    match repo.list_approval_lines(org_id, app_id).await {
        Ok(lines) => {
            let response: Vec<ApprovalLineResponse> = lines
                .into_iter()
                .map(ApprovalLineResponse::from)
                .collect();
            (StatusCode::OK, Json(json!({ "approval_lines": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list approval lines");
            map_approval_error(&e)
        }
    }
}

/// PATCH `/organizations/{org_id}/applications/{app_id}/approvals/{line_id}` -
/// Assign an approver or edit comments on a pending line.
async fn update_approval_line(
    State(state): State<AppState>,
    Path((org_id, app_id, line_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<UpdateApprovalLineRequest>,
) -> impl IntoResponse {
    let repo = ApprovalRepository::new((*state.db).clone());
    match repo
        .update_approval_line(
            org_id,
            app_id,
            line_id,
            UpdateApprovalLineInput {
                approver_id: payload.approver_id.map(Some),
                comments: payload.comments.map(Some),
            },
        )
        .await
    {
        Ok(line) => (
            StatusCode::OK,
            Json(json!({ "approval_line": ApprovalLineResponse::from(line) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update approval line");
            map_approval_error(&e)
        }
    }
}
