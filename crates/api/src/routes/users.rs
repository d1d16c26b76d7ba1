//! User directory routes.
//!
//! Users are slim directory records: creators, approvers, and followers
//! are identified by user id. No credentials are held here; access
//! control stays with the surrounding deployment.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use crate::AppState;
use fundline_db::repositories::UserRepository;
use fundline_shared::AppError;

/// Creates the user directory routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users", get(list_users))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a user.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Owning organization.
    pub organization_id: Uuid,
    /// User email, unique across the directory.
    pub email: String,
    /// Display name.
    pub full_name: String,
}

/// Query parameters for listing users.
#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    /// Restrict to one organization.
    pub organization_id: Option<Uuid>,
}

/// Response for a user.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// User email.
    pub email: String,
    /// Display name.
    pub full_name: String,
    /// Whether the user is active.
    pub is_active: bool,
}

impl From<fundline_db::entities::users::Model> for UserResponse {
    fn from(user: fundline_db::entities::users::Model) -> Self {
        Self {
            id: user.id,
            organization_id: user.organization_id,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
        }
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/users` - Create a user.
async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<CreateUserRequest>,
) -> impl IntoResponse {
    let email = payload.email.trim();
    if email.is_empty() || !email.contains('@') || payload.full_name.trim().is_empty() {
        return map_app_error(&AppError::Validation(
            "email and full_name must not be empty".to_string(),
        ));
    }

    let repo = UserRepository::new((*state.db).clone());

    match repo.find_by_email(email).await {
        Ok(Some(_)) => {
            return map_app_error(&AppError::Conflict(format!(
                "A user with email {email} already exists"
            )));
        }
        Ok(None) => {}
        Err(e) => {
            error!(error = %e, "Failed to check email");
            return map_app_error(&AppError::Database(e.to_string()));
        }
    }

    match repo
        .create(payload.organization_id, email, payload.full_name.trim())
        .await
    {
        Ok(user) => (
            StatusCode::CREATED,
            Json(json!({ "user": UserResponse::from(user) })),
        )
            .into_response(),
        Err(e) => {
            error!(error = %e, "Failed to create user");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

/// GET `/users` - List users, optionally scoped to one organization.
async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> impl IntoResponse {
    let repo = UserRepository::new((*state.db).clone());
    match repo.list(query.organization_id).await {
        Ok(users) => {
            let response: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
            (StatusCode::OK, Json(json!({ "users": response }))).into_response()
        }
        Err(e) => {
            error!(error = %e, "Failed to list users");
            map_app_error(&AppError::Database(e.to_string()))
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

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
