//! Budget line routes.
//!
//! Lines carry the allocation/spend pair; the stored variance and the
//! mirrored currency are maintained by the repository at every write.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use fundline_core::budget::VarianceStatus;
use fundline_db::entities::budget_lines;
use fundline_db::repositories::{
    BudgetLineError, BudgetLineRepository, CreateBudgetLineInput, UpdateBudgetLineInput,
};

/// Creates the budget line routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/organizations/{org_id}/applications/{app_id}/lines",
            get(list_budget_lines).post(create_budget_line),
        )
        .route(
            "/organizations/{org_id}/applications/{app_id}/lines/{line_id}",
            axum::routing::patch(update_budget_line).delete(delete_budget_line),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a budget line.
#[derive(Debug, Deserialize)]
pub struct CreateBudgetLineRequest {
    /// Line name.
    pub name: String,
    /// Expense category reference.
    pub expense_category_id: Uuid,
    /// Donor fund reference, if donor-funded.
    pub donor_fund_id: Option<Uuid>,
    /// Allocated amount.
    pub allocated_amount: Decimal,
    /// Actual spend recorded so far.
    pub actual_spend: Option<Decimal>,
}

/// Request body for updating a budget line.
#[derive(Debug, Deserialize)]
pub struct UpdateBudgetLineRequest {
    /// New name.
    pub name: Option<String>,
    /// New expense category reference.
    pub expense_category_id: Option<Uuid>,
    /// New donor fund reference.
    pub donor_fund_id: Option<Uuid>,
    /// New allocated amount.
    pub allocated_amount: Option<Decimal>,
    /// New actual spend.
    pub actual_spend: Option<Decimal>,
}

/// Response for a budget line.
#[derive(Debug, Serialize)]
pub struct BudgetLineResponse {
    /// Line ID.
    pub id: Uuid,
    /// Owning application.
    pub budget_application_id: Uuid,
    /// Line name.
    pub name: String,
    /// Expense category reference.
    pub expense_category_id: Uuid,
    /// Donor fund reference, if any.
    pub donor_fund_id: Option<Uuid>,
    /// Allocated amount.
    pub allocated_amount: String,
    /// Actual spend.
    pub actual_spend: String,
    /// Stored variance (allocated minus actual).
    pub variance: String,
    /// Classification of the variance.
    pub variance_status: VarianceStatus,
    /// Currency mirrored from the parent application.
    pub currency: String,
}

impl From<budget_lines::Model> for BudgetLineResponse {
    fn from(line: budget_lines::Model) -> Self {
        Self {
            id: line.id,
            budget_application_id: line.budget_application_id,
            name: line.name,
            expense_category_id: line.expense_category_id,
            donor_fund_id: line.donor_fund_id,
            allocated_amount: line.allocated_amount.to_string(),
            actual_spend: line.actual_spend.to_string(),
            variance: line.variance.to_string(),
            variance_status: VarianceStatus::classify(line.variance),
            currency: line.currency,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Maps a budget line repository error to an HTTP response.
fn map_budget_line_error(e: &BudgetLineError) -> axum::response::Response {
    match e {
        BudgetLineError::ApplicationNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "not_found",
                "message": format!("Budget application not found: {id}")
            })),
        )
            .into_response(),
        BudgetLineError::LineNotFound(id) => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "budget_line_not_found",
                "message": format!("Budget line not found: {id}")
            })),
        )
            .into_response(),
        BudgetLineError::EmptyName => (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": "empty_name",
                "message": "Budget line name cannot be empty"
            })),
        )
            .into_response(),
        BudgetLineError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "internal_error",
                "message": "An error occurred"
            })),
        )
            .into_response(),
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/organizations/{org_id}/applications/{app_id}/lines` - List lines.
async fn list_budget_lines(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = BudgetLineRepository::new((*state.db).clone());
    match repo.list_lines(org_id, app_id).await {
        Ok(lines) => {
            let response: Vec<BudgetLineResponse> =
                lines.into_iter().map(BudgetLineResponse::from).collect();
            (StatusCode::OK, Json(json!({ "budget_lines": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list budget lines");
            map_budget_line_error(&e)
        }
    }
}

/// POST `/organizations/{org_id}/applications/{app_id}/lines` - Create a line.
async fn create_budget_line(
    State(state): State<AppState>,
    Path((org_id, app_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<CreateBudgetLineRequest>,
) -> impl IntoResponse {
    let repo = BudgetLineRepository::new((*state.db).clone());
    match repo
        .create_line(
            org_id,
            app_id,
            CreateBudgetLineInput {
                name: payload.name,
                expense_category_id: payload.expense_category_id,
                donor_fund_id: payload.donor_fund_id,
                allocated_amount: payload.allocated_amount,
                actual_spend: payload.actual_spend,
            },
        )
        .await
    {
        Ok(line) => (
            StatusCode::CREATED,
            Json(json!({ "budget_line": BudgetLineResponse::from(line) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create budget line");
            map_budget_line_error(&e)
        }
    }
}

/// PATCH `/organizations/{org_id}/applications/{app_id}/lines/{line_id}` -
/// Update a line; variance and currency mirror are recomputed.
async fn update_budget_line(
    State(state): State<AppState>,
    Path((org_id, app_id, line_id)): Path<(Uuid, Uuid, Uuid)>,
    Json(payload): Json<UpdateBudgetLineRequest>,
) -> impl IntoResponse {
    let repo = BudgetLineRepository::new((*state.db).clone());
    match repo
        .update_line(
            org_id,
            app_id,
            line_id,
            UpdateBudgetLineInput {
                name: payload.name,
                expense_category_id: payload.expense_category_id,
                donor_fund_id: payload.donor_fund_id.map(Some),
                allocated_amount: payload.allocated_amount,
                actual_spend: payload.actual_spend,
            },
        )
        .await
    {
        Ok(line) => (
            StatusCode::OK,
            Json(json!({ "budget_line": BudgetLineResponse::from(line) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to update budget line");
            map_budget_line_error(&e)
        }
    }
}

/// DELETE `/organizations/{org_id}/applications/{app_id}/lines/{line_id}` -
/// Delete a line.
async fn delete_budget_line(
    State(state): State<AppState>,
    Path((org_id, app_id, line_id)): Path<(Uuid, Uuid, Uuid)>,
) -> impl IntoResponse {
    let repo = BudgetLineRepository::new((*state.db).clone());
    match repo.delete_line(org_id, app_id, line_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            error!(error = %e, "Failed to delete budget line");
            map_budget_line_error(&e)
        }
    }
}
