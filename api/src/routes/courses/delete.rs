use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use sea_orm::{EntityTrait, ModelTrait};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;
use crate::routes::courses::common::CourseResponse;

use db::models::course;

/// DELETE /api/courses/delete/{course_id}
///
/// Deletes a course. Schedule slots, enrollments, sessions and records go
/// with it via foreign-key cascade. Only the owning teacher (or an admin)
/// may delete.
pub async fn delete_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<CourseResponse>>) {
    let db = state.db();

    let existing = match course::Entity::find_by_id(course_id).one(db).await {
        Ok(Some(c)) => c,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Course not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if existing.teacher_id != claims.sub && !claims.is_admin() {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error("Not authorized to delete this course")),
        );
    }

    match existing.delete(db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                CourseResponse::default(),
                "Course deleted successfully",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}
