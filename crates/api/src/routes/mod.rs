//! API route definitions.

use axum::Router;

use crate::AppState;

pub mod applications;
pub mod approval_lines;
pub mod budget_lines;
pub mod health;
pub mod organizations;
pub mod users;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(organizations::routes())
        .merge(users::routes())
        .merge(applications::routes())
        .merge(approval_lines::routes())
        .merge(budget_lines::routes())
}
