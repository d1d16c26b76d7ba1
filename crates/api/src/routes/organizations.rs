//! Organization and registry routes.
//!
//! Organizations own every other record and supply the default currency
//! for new budget applications. The expense-category and donor-fund
//! registries live here too: budget lines reference them, nothing
//! validates them beyond the foreign keys.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use fundline_db::repositories::{DirectoryRepository, OrganizationRepository};
use fundline_shared::AppError;

/// Creates the organization and registry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations", post(create_organization))
        .route("/organizations/{org_id}", get(get_organization))
        .route(
            "/organizations/{org_id}/expense-categories",
            get(list_expense_categories).post(create_expense_category),
        )
        .route(
            "/organizations/{org_id}/donor-funds",
            get(list_donor_funds).post(create_donor_fund),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an organization.
#[derive(Debug, Deserialize)]
pub struct CreateOrganizationRequest {
    /// Organization name.
    pub name: String,
    /// Base currency code (ISO 4217).
    pub base_currency: String,
}

/// Response for an organization.
#[derive(Debug, Serialize)]
pub struct OrganizationResponse {
    /// Organization ID.
    pub id: Uuid,
    /// Organization name.
    pub name: String,
    /// Base currency code.
    pub base_currency: String,
    /// Created at timestamp.
    pub created_at: String,
}

/// Request body for creating a registry entry.
#[derive(Debug, Deserialize)]
pub struct CreateRegistryEntryRequest {
    /// Entry code, unique per organization.
    pub code: String,
    /// Entry display name.
    pub name: String,
}

/// Response for a registry entry (expense category or donor fund).
#[derive(Debug, Serialize)]
pub struct RegistryEntryResponse {
    /// Entry ID.
    pub id: Uuid,
    /// Entry code.
    pub code: String,
    /// Entry display name.
    pub name: String,
    /// Whether the entry is active.
    pub is_active: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/organizations` - Create an organization.
async fn create_organization(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrganizationRequest>,
) -> impl IntoResponse {
    if payload.name.trim().is_empty() {
        return map_app_error(&AppError::Validation(
            "name must not be empty".to_string(),
        ));
    }
    let currency = payload.base_currency.trim().to_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
        return map_app_error(&AppError::Validation(
            "base_currency must be a three-letter ISO 4217 code".to_string(),
        ));
    }

    let repo = OrganizationRepository::new((*state.db).clone());
    match repo.currency_exists(&currency).await {
        Ok(true) => {}
        Ok(false) => {
            return map_app_error(&AppError::Validation(format!(
                "unknown currency code: {currency}"
            )));
        }
        Err(e) => {
            error!(error = %e, "Failed to check currency");
            return map_app_error(&AppError::Database(e.to_string()));
        }
    }

    match repo.create(payload.name.trim(), &currency).await {
        Ok(org) => (
            StatusCode::CREATED,
            Json(json!({ "organization": OrganizationResponse {
                id: org.id,
                name: org.name,
                base_currency: org.base_currency,
                created_at: org.created_at.to_rfc3339(),
            }})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create organization");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

/// GET `/organizations/{org_id}` - Get an organization.
async fn get_organization(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = OrganizationRepository::new((*state.db).clone());
    match repo.find_by_id(org_id).await {
        Ok(Some(org)) => (
            StatusCode::OK,
            Json(json!({ "organization": OrganizationResponse {
                id: org.id,
                name: org.name,
                base_currency: org.base_currency,
                created_at: org.created_at.to_rfc3339(),
            }})),
        )
            .into_response(),
        Ok(None) => map_app_error(&AppError::NotFound(format!("Organization {org_id}"))),
        Err(e) => {
            error!(error = %e, "Failed to find organization");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

/// GET `/organizations/{org_id}/expense-categories` - List expense categories.
async fn list_expense_categories(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = DirectoryRepository::new((*state.db).clone());
    match repo.list_expense_categories(org_id).await {
        Ok(categories) => {
            let response: Vec<RegistryEntryResponse> = categories
                .into_iter()
                .map(|category| RegistryEntryResponse {
                    id: category.id,
                    code: category.code,
                    name: category.name,
                    is_active: category.is_active,
                })
                .collect();
            (StatusCode::OK, Json(json!({ "expense_categories": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list expense categories");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

/// POST `/organizations/{org_id}/expense-categories` - Create an expense category.
async fn create_expense_category(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<CreateRegistryEntryRequest>,
) -> impl IntoResponse {
    if let Err(response) = validate_registry_fields(&payload.name, &payload.code) {
        return response;
    }

    let repo = DirectoryRepository::new((*state.db).clone());
    match repo
        .create_expense_category(org_id, payload.code.trim(), payload.name.trim())
        .await
    {
        Ok(category) => (
            StatusCode::CREATED,
            Json(json!({ "expense_category": RegistryEntryResponse {
                id: category.id,
                code: category.code,
                name: category.name,
                is_active: category.is_active,
            }})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create expense category");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

/// GET `/organizations/{org_id}/donor-funds` - List donor funds.
async fn list_donor_funds(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
) -> impl IntoResponse {
    let repo = DirectoryRepository::new((*state.db).clone());
    match repo.list_donor_funds(org_id).await {
        Ok(funds) => {
            let response: Vec<RegistryEntryResponse> = funds
                .into_iter()
                .map(|fund| RegistryEntryResponse {
                    id: fund.id,
                    code: fund.code,
                    name: fund.name,
                    is_active: fund.is_active,
                })
                .collect();
            (StatusCode::OK, Json(json!({ "donor_funds": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list donor funds");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

/// POST `/organizations/{org_id}/donor-funds` - Create a donor fund.
async fn create_donor_fund(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<CreateRegistryEntryRequest>,
) -> impl IntoResponse {
    if let Err(response) = validate_registry_fields(&payload.name, &payload.code) {
        return response;
    }

    let repo = DirectoryRepository::new((*state.db).clone());
    match repo
        .create_donor_fund(org_id, payload.code.trim(), payload.name.trim())
        .await
    {
        Ok(fund) => (
            StatusCode::CREATED,
            Json(json!({ "donor_fund": RegistryEntryResponse {
                id: fund.id,
                code: fund.code,
                name: fund.name,
                is_active: fund.is_active,
            }})),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create donor fund");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Rejects empty name/code fields before touching the repository.
fn validate_registry_fields(
    name: &str,
    code: &str,
) -> Result<(), axum::response::Response> {
    if name.trim().is_empty() || code.trim().is_empty() {
        return Err(map_app_error(&AppError::Validation(
            "name and code must not be empty".to_string(),
        )));
    }
    Ok(())
}

/// Maps a shared application error to an HTTP response.
fn map_app_error(e: &AppError) -> axum::response::Response {
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
