use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::AttendanceSessionResponse;
use db::models::{
    attendance_record, attendance_session, course,
    course_schedule_slot::{self, resolve_session_window},
};

/// POST /api/attendance/create/{course_id}
///
/// Opens today's attendance session for a course: resolves the lecture window
/// from the weekly schedule, persists the session, and bulk-issues one
/// pending record per enrolled student with a snapshot of their current face
/// descriptor.
///
/// ### Responses
/// - `201 Created` with the session and the number of records issued
/// - `400 Bad Request` with a distinct message per schedule rejection
///   (no class today, incomplete schedule, too early, too late)
/// - `404 Not Found` for an unknown course
pub async fn create_session(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<AttendanceSessionResponse>>) {
    let db = state.db();
    let now = Utc::now();

    let course = match course::Model::find_by_id(db, course_id).await {
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

    let slots = match course_schedule_slot::Model::for_course(db, course.id).await {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    // Every rejection reason surfaces as its own stable message.
    let window = match resolve_session_window(&slots, now) {
        Ok(w) => w,
        Err(reason) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(reason.to_string())),
            );
        }
    };

    let session =
        match attendance_session::Model::create(db, course.id, claims.sub, &window, now).await {
            Ok(s) => s,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!(
                        "Failed to create attendance session: {e}"
                    ))),
                );
            }
        };

    let students = match course::Model::enrolled_students(db, course.id).await {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    let records_created = match attendance_record::Model::materialize_roster(
        db, &session, claims.sub, &students, now,
    )
    .await
    {
        Ok(n) => n,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!(
                    "Failed to issue attendance records: {e}"
                ))),
            );
        }
    };

    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            AttendanceSessionResponse::from_session(session, records_created),
            "Attendance session created successfully",
        )),
    )
}
