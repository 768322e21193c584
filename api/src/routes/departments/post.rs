use axum::{Json, extract::State, http::StatusCode};
use util::state::AppState;

use crate::response::ApiResponse;

use super::common::{CreateDepartmentRequest, DepartmentResponse};
use db::models::department;

/// POST /api/departments/create
///
/// Creates a department with an empty course list.
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` on an empty name
/// - `409 Conflict` on a duplicate name
pub async fn create_department(
    State(state): State<AppState>,
    Json(req): Json<CreateDepartmentRequest>,
) -> (StatusCode, Json<ApiResponse<DepartmentResponse>>) {
    let name = req.name.trim();
    if name.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Department name is required.")),
        );
    }

    match department::Model::create(state.db(), name).await {
        Ok(row) => (
            StatusCode::CREATED,
            Json(ApiResponse::success(
                DepartmentResponse::from(row),
                "Department created successfully",
            )),
        ),
        Err(e) if e.to_string().contains("UNIQUE") => (
            StatusCode::CONFLICT,
            Json(ApiResponse::error(
                "A department with this name already exists",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Error creating department: {e}"))),
        ),
    }
}
