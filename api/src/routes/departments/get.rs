use axum::{Json, extract::State, http::StatusCode};
use util::state::AppState;

use crate::response::ApiResponse;

use super::common::DepartmentResponse;
use db::models::department;

/// GET /api/departments
///
/// Lists all departments, alphabetically.
pub async fn list_departments(
    State(state): State<AppState>,
) -> (StatusCode, Json<ApiResponse<Vec<DepartmentResponse>>>) {
    match department::Model::find_all(state.db()).await {
        Ok(rows) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                rows.into_iter().map(DepartmentResponse::from).collect(),
                "Departments retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Error fetching departments: {e}"
            ))),
        ),
    }
}
