//! HTTP route entry point for `/api/...`.
//!
//! Route groups:
//! - `/health` → Health check endpoint (public)
//! - `/auth` → Registration, login and profile endpoints
//! - `/departments` → Department listing and creation
//! - `/courses` → Course management and enrollment
//! - `/attendance` → Attendance session lifecycle, marking and reporting

use axum::Router;
use util::state::AppState;

pub mod attendance;
pub mod auth;
pub mod courses;
pub mod departments;
pub mod health;

/// Builds the complete application router for all HTTP endpoints.
pub fn routes(app_state: AppState) -> Router {
    Router::new()
        .nest("/health", health::health_routes())
        .nest("/auth", auth::auth_routes(app_state.clone()))
        .nest("/departments", departments::department_routes(app_state.clone()))
        .nest("/courses", courses::course_routes(app_state.clone()))
        .nest("/attendance", attendance::attendance_routes(app_state))
}
