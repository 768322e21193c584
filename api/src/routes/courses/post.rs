use axum::{Extension, Json, extract::State, http::StatusCode};
use common::format_validation_errors;
use util::state::AppState;
use validator::Validate;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::{CourseResponse, CreateCourseRequest, RegisterCoursesRequest};
use db::models::{course, course_schedule_slot, course_student, department};

/// POST /api/courses/create
///
/// Creates a course owned by the calling teacher, together with its weekly
/// schedule slots.
///
/// ### Responses
/// - `201 Created`
/// - `400 Bad Request` (validation failure, unknown department, bad weekday)
/// - `409 Conflict` (duplicate course code)
pub async fn create_course(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<CreateCourseRequest>,
) -> (StatusCode, Json<ApiResponse<CourseResponse>>) {
    let db = state.db();

    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    // Weekday names must resolve before anything is written.
    let mut slots: Vec<(i16, Option<String>, Option<String>)> = Vec::new();
    for entry in &req.schedule {
        let Some(weekday) = course_schedule_slot::weekday_index_from_name(&entry.day) else {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!(
                    "Invalid weekday: {}",
                    entry.day
                ))),
            );
        };
        slots.push((weekday, entry.start_time.clone(), entry.end_time.clone()));
    }

    match department::Model::find_by_id(db, req.department_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("Department not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    }

    match course::Model::find_by_code(db, &req.code).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("Course code already exists")),
            );
        }
        Ok(None) => {}
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    }

    let created = course::Model::create(
        db,
        &req.name,
        &req.code,
        claims.sub,
        req.department_id,
        req.semester_start,
        req.semester_months,
    )
    .await;
    let created = match created {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    for (weekday, start, end) in slots {
        if let Err(e) = course_schedule_slot::Model::create(
            db,
            created.id,
            weekday,
            start.as_deref(),
            end.as_deref(),
        )
        .await
        {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    }

    let slots = course_schedule_slot::Model::for_course(db, created.id)
        .await
        .unwrap_or_default();
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            CourseResponse::from_with_schedule(created, slots),
            "Course created successfully",
        )),
    )
}

/// POST /api/courses/register
///
/// Enrolls the calling student in every course of the given department.
/// Already-enrolled courses are skipped.
pub async fn register_courses(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<RegisterCoursesRequest>,
) -> (StatusCode, Json<ApiResponse<Vec<CourseResponse>>>) {
    let db = state.db();

    match department::Model::find_by_id(db, req.department_id).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("Department not found")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    }

    let courses = match course::Model::find_for_department(db, req.department_id).await {
        Ok(list) => list,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    for c in &courses {
        if let Err(e) = course_student::Model::enroll(db, c.id, claims.sub).await {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    }

    let mut out = Vec::with_capacity(courses.len());
    for c in courses {
        let slots = course_schedule_slot::Model::for_course(db, c.id)
            .await
            .unwrap_or_default();
        out.push(CourseResponse::from_with_schedule(c, slots));
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(out, "Courses registered successfully")),
    )
}
