//! Budget application routes.
//!
//! Record CRUD plus the three approval-chain entry points. Every action
//! route addresses exactly one application by id; there are no batch
//! semantics.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, post},
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use fundline_core::approval::ApprovalError;
use fundline_core::budget::{LineTotals, VarianceStatus};
use fundline_db::entities::{budget_applications, sea_orm_active_enums::ApprovalStage, stage_events};
use fundline_db::repositories::{
    ApplicationError, ApplicationRepository, ApprovalRepository, CreateApplicationInput,
    UpdateApplicationInput,
};
use fundline_shared::types::PageRequest;

use super::budget_lines::BudgetLineResponse;

/// Creates the budget application routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/applications",
            get(list_applications).post(create_application),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}",
            get(get_application)
                .patch(update_application)
                .delete(delete_application),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/submit",
            post(submit_application),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/approve",
            post(approve_application),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/reject",
            post(reject_application),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/events",
            get(list_stage_events),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/followers",
            get(list_followers).post(add_follower),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/followers/{user_id}",
            delete(remove_follower),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a budget application.
#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    /// Reference; generated from the organization's sequence when absent.
    pub reference: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// First day of the validity window.
    pub start_date: NaiveDate,
    /// Last day of the validity window.
    pub end_date: NaiveDate,
    /// Requested total; defaults to zero.
    pub total_budget: Option<Decimal>,
    /// Currency code; defaults from the organization.
    pub currency: Option<String>,
    /// User creating the application.
    pub created_by: Uuid,
}

/// Request body for updating a budget application.
#[derive(Debug, Deserialize)]
pub struct UpdateApplicationRequest {
    /// New description.
    pub description: Option<String>,
    /// New start date.
    pub start_date: Option<NaiveDate>,
    /// New end date.
    pub end_date: Option<NaiveDate>,
    /// New requested total.
    pub total_budget: Option<Decimal>,
    /// New currency code; line mirrors are rewritten.
    pub currency: Option<String>,
}

/// Query parameters for listing applications.
#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    /// Filter by approval stage.
    pub stage: Option<String>,
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Items per page.
    pub per_page: Option<u32>,
}

/// Request body for approve/reject actions.
#[derive(Debug, Default, Deserialize)]
pub struct ActionRequest {
    /// Comments recorded on the line the action resolves.
    pub comments: Option<String>,
}

/// Request body for subscribing a follower.
#[derive(Debug, Deserialize)]
pub struct AddFollowerRequest {
    /// User to subscribe.
    pub user_id: Uuid,
}

/// Response for a budget application.
#[derive(Debug, Serialize)]
pub struct ApplicationResponse {
    /// Application ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Generated or supplied reference.
    pub reference: String,
    /// Free-text description.
    pub description: Option<String>,
    /// First day of the validity window.
    pub start_date: NaiveDate,
    /// Last day of the validity window.
    pub end_date: NaiveDate,
    /// Requested total.
    pub total_budget: String,
    /// Currency code.
    pub currency: String,
    /// Coarse status projection.
    pub status: String,
    /// Approval chain progress pointer.
    pub approval_stage: String,
    /// Approver of the pending line, when one is assigned.
    pub current_approver_id: Option<Uuid>,
    /// Creating user.
    pub created_by: Uuid,
    /// Created at timestamp.
    pub created_at: String,
    /// Updated at timestamp.
    pub updated_at: String,
}

impl From<budget_applications::Model> for ApplicationResponse {
    fn from(app: budget_applications::Model) -> Self {
        Self {
            id: app.id,
            organization_id: app.organization_id,
            reference: app.reference,
            description: app.description,
            start_date: app.start_date,
            end_date: app.end_date,
            total_budget: app.total_budget.to_string(),
            currency: app.currency,
            status: status_to_string(app.status),
            approval_stage: stage_to_string(app.approval_stage),
            current_approver_id: app.current_approver_id,
            created_by: app.created_by,
            created_at: app.created_at.to_rfc3339(),
            updated_at: app.updated_at.to_rfc3339(),
        }
    }
}

/// Aggregated line figures reported on the detail view.
#[derive(Debug, Serialize)]
pub struct TotalsResponse {
    /// Sum of allocated amounts.
    pub allocated: String,
    /// Sum of actual spend.
    pub actual_spend: String,
    /// Sum of stored variances.
    pub variance: String,
    /// Classification of the aggregate variance.
    pub variance_status: VarianceStatus,
}

impl From<LineTotals> for TotalsResponse {
    fn from(totals: LineTotals) -> Self {
        Self {
            allocated: totals.allocated.to_string(),
            actual_spend: totals.actual_spend.to_string(),
            variance: totals.variance.to_string(),
            variance_status: totals.status(),
        }
    }
}

/// Response for one stage-event audit record.
#[derive(Debug, Serialize)]
pub struct StageEventResponse {
    /// Event ID.
    pub id: Uuid,
    /// Stage before the action.
    pub from_stage: String,
    /// Stage after the action.
    pub to_stage: String,
    /// Comments passed with the action, if any.
    pub note: Option<String>,
    /// When the transition happened.
    pub created_at: String,
}

impl From<stage_events::Model> for StageEventResponse {
    fn from(event: stage_events::Model) -> Self {
        Self {
            id: event.id,
            from_stage: stage_to_string(event.from_stage),
            to_stage: stage_to_string(event.to_stage),
            note: event.note,
            created_at: event.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Renders the stored stage as its API label.
pub(super) fn stage_to_string(stage: ApprovalStage) -> String {
    match stage {
        ApprovalStage::Draft => "draft",
        ApprovalStage::Level1 => "level_1",
        ApprovalStage::Level2 => "level_2",
        ApprovalStage::Level3 => "level_3",
        ApprovalStage::Approved => "approved",
        ApprovalStage::Rejected => "rejected",
    }
    .to_string()
}

/// Parses an API stage label into the stored stage.
fn parse_stage(s: &str) -> Option<ApprovalStage> {
    match s.to_lowercase().as_str() {
        "draft" => Some(ApprovalStage::Draft),
        "level_1" => Some(ApprovalStage::Level1),
        "level_2" => Some(ApprovalStage::Level2),
        "level_3" => Some(ApprovalStage::Level3),
        "approved" => Some(ApprovalStage::Approved),
        "rejected" => Some(ApprovalStage::Rejected),
        _ => None,
    }
}

/// Renders the stored coarse status as its API label.
fn status_to_string(status: fundline_db::entities::sea_orm_active_enums::ApplicationStatus) -> String {
    use fundline_db::entities::sea_orm_active_enums::ApplicationStatus;
    match status {
        ApplicationStatus::Draft => "draft",
        ApplicationStatus::Approved => "approved",
        ApplicationStatus::Rejected => "rejected",
    }
    .to_string()
}

/// Maps an application repository error to an HTTP response.
fn map_application_error(e: &ApplicationError) -> axum::response::Response {
    match e {
        ApplicationError::NotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": format!("Budget application not found: {id}")
            })),
        )
            .into_response(),
        ApplicationError::OrganizationNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "organization_not_found",
                "message": format!("Organization not found: {id}")
            })),
        )
            .into_response(),
        ApplicationError::UserNotFound(id) => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "user_not_found",
                "message": format!("User not found: {id}")
            })),
        )
            .into_response(),
        ApplicationError::FollowerNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "follower_not_found",
                "message": format!("User {id} does not follow this application")
            })),
        )
            .into_response(),
        ApplicationError::EmptyReference => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "empty_reference",
                "message": "Reference cannot be empty"
            })),
        )
            .into_response(),
        ApplicationError::SequenceNotFound(code) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "sequence_not_found",
                "message": format!("No sequence registered for code {code}")
            })),
        )
            .into_response(),
        ApplicationError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}

/// Maps an approval error to an HTTP response via its status/error codes.
pub(super) fn map_approval_error(e: &ApprovalError) -> axum::response::Response {
    let status = StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
        "An error occurred".to_string()
    } else {
        e.to_string()
    };
    (
        status,
        Json(json!({
            "error": e.error_code().to_lowercase(),
            "message": message
        })),
    )
        .into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/organizations/{org_id}/applications` - Create a budget application.
async fn create_application(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<CreateApplicationRequest>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());

    match repo
        .create_application(CreateApplicationInput {
            organization_id: org_id,
            reference: payload.reference,
            description: payload.description,
            start_date: payload.start_date,
            end_date: payload.end_date,
            total_budget: payload.total_budget,
            currency: payload.currency,
            created_by: payload.created_by,
        })
        .await
    {
        Ok(app) => (
            StatusCode::CREATED,
            Json(json!({ "application": ApplicationResponse::from(app) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create application");
            map_application_error(&e)
        }
    }
}

/// GET `/organizations/{org_id}/applications` - List applications.
async fn list_applications(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Query(query): Query<ListApplicationsQuery>,
) -> impl IntoResponse {
    let stage = match query.stage.as_deref() {
        Some(s) => match parse_stage(s) {
            Some(stage) => Some(stage),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": "invalid_stage",
                        "message": "Invalid stage. Must be one of: draft, level_1, level_2, level_3, approved, rejected"
                    })),
                )
                    .into_response();
            }
        },
        None => None,
    };

    let defaults = PageRequest::default();
    let page = PageRequest {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };

    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.list_applications(org_id, stage, &page).await {
        Ok(page) => {
            let data: Vec<ApplicationResponse> = page
                .data
                .into_iter()
                .map(ApplicationResponse::from)
                .collect();
            (
                StatusCode::OK,
                Json(json!({ "applications": data, "meta": page.meta })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list applications");
            map_application_error(&e)
        }
    }
}

/// GET `/organizations/{org_id}/applications/{app_id}` - Get an application
/// with its lines, approvals, and computed totals.
async fn get_application(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.get_application_details(org_id, app_id).await {
        Ok(details) => {
            let budget_lines: Vec<BudgetLineResponse> = details
                .budget_lines
                .into_iter()
                .map(BudgetLineResponse::from)
                .collect();
            let approval_lines: Vec<super::approval_lines::ApprovalLineResponse> = details
                .approval_lines
                .into_iter()
                .map(super::approval_lines::ApprovalLineResponse::from)
                .collect();
            (
                StatusCode::OK,
                Json(json!({
                    "application": ApplicationResponse::from(details.application),
                    "budget_lines": budget_lines,
                    "approval_lines": approval_lines,
                    "totals": TotalsResponse::from(details.totals),
                })),
            )
                .into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to get application");
            map_application_error(&e)
        }
    }
}

/// PATCH `/organizations/{org_id}/applications/{app_id}` - Update an application.
async fn update_application(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateApplicationRequest>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo
        .update_application(
            org_id,
            app_id,
            UpdateApplicationInput {
                description: payload.description.map(Some),
                start_date: payload.start_date,
                end_date: payload.end_date,
                total_budget: payload.total_budget,
                currency: payload.currency,
            },
        )
        .await
    {
        Ok(app) => (
            StatusCode::OK,
            Json(json!({ "application": ApplicationResponse::from(app) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update application");
            map_application_error(&e)
        }
    }
}

/// DELETE `/organizations/{org_id}/applications/{app_id}` - Delete an application.
async fn delete_application(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.delete_application(org_id, app_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete application");
            map_application_error(&e)
        }
    }
}

/// POST `/organizations/{org_id}/applications/{app_id}/submit` - Enter the chain.
async fn submit_application(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ApprovalRepository::new((*state.db).clone());
    match repo.submit(org_id, app_id).await {
        Ok(app) => (
            StatusCode::OK,
            Json(json!({ "application": ApplicationResponse::from(app) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to submit application");
            map_approval_error(&e)
        }
    }
}

/// POST `/organizations/{org_id}/applications/{app_id}/approve` - Approve at
/// the current stage.
async fn approve_application(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<ActionRequest>>,
) -> impl IntoResponse {
    let comments = payload.and_then(|Json(body)| body.comments);
    let repo = ApprovalRepository::new((*state.db).clone());
    match repo.approve(org_id, app_id, comments).await {
        Ok(app) => (
            StatusCode::OK,
            Json(json!({ "application": ApplicationResponse::from(app) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to approve application");
            map_approval_error(&e)
        }
    }
}

/// POST `/organizations/{org_id}/applications/{app_id}/reject` - Reject.
async fn reject_application(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
    payload: Option<Json<ActionRequest>>,
) -> impl IntoResponse {
    let comments = payload.and_then(|Json(body)| body.comments);
    let repo = ApprovalRepository::new((*state.db).clone());
    match repo.reject(org_id, app_id, comments).await {
        Ok(app) => (
            StatusCode::OK,
            Json(json!({ "application": ApplicationResponse::from(app) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to reject application");
            map_approval_error(&e)
        }
    }
}

/// GET `/organizations/{org_id}/applications/{app_id}/events` - Stage audit trail.
async fn list_stage_events(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.list_stage_events(org_id, app_id).await {
        Ok(events) => {
            let response: Vec<StageEventResponse> =
                events.into_iter().map(StageEventResponse::from).collect();
            (StatusCode::OK, Json(json!({ "events": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list stage events");
            map_application_error(&e)
        }
    }
}

/// GET `/organizations/{org_id}/applications/{app_id}/followers` - List followers.
async fn list_followers(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.list_followers(org_id, app_id).await {
        Ok(followers) => {
            let response: Vec<serde_json::Value> = followers
                .into_iter()
                .map(|(follower, user)| {
                    json!({
                        "user_id": user.id,
                        "email": user.email,
                        "full_name": user.full_name,
                        "since": follower.created_at.to_rfc3339(),
                    })
                })
                .collect();
            (StatusCode::OK, Json(json!({ "followers": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list followers");
            map_application_error(&e)
        }
    }
}

/// POST `/organizations/{org_id}/applications/{app_id}/followers` - Subscribe a user.
async fn add_follower(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddFollowerRequest>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.add_follower(org_id, app_id, payload.user_id).await {
        Ok(follower) => (
            StatusCode::CREATED,
            Json(json!({
                "follower": {
                    "user_id": follower.user_id,
                    "since": follower.created_at.to_rfc3339(),
                }
            })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to add follower");
            map_application_error(&e)
        }
    }
}

/// DELETE `/organizations/{org_id}/applications/{app_id}/followers/{user_id}` -
/// Unsubscribe a user.
async fn remove_follower(
    State(state): State<AppState>,
    Path((org_id, app_id, user_id)): Path<(Uuid, Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = ApplicationRepository::new((*state.db).clone());
    match repo.remove_follower(org_id, app_id, user_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to remove follower");
            map_application_error(&e)
        }
    }
}
