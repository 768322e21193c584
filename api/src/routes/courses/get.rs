use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::{CourseReportResponse, CourseResponse};
use db::models::{attendance_record, course, course_schedule_slot, course_student, user::Role};

async fn with_schedules(
    db: &sea_orm::DatabaseConnection,
    courses: Vec<course::Model>,
) -> Result<Vec<CourseResponse>, sea_orm::DbErr> {
    let mut out = Vec::with_capacity(courses.len());
    for c in courses {
        let slots = course_schedule_slot::Model::for_course(db, c.id).await?;
        out.push(CourseResponse::from_with_schedule(c, slots));
    }
    Ok(out)
}

/// GET /api/courses
///
/// Role-scoped course listing: admins see everything, teachers their own
/// courses, students the courses they are enrolled in.
pub async fn list_courses(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<CourseResponse>>>) {
    let db = state.db();

    let courses = match claims.role {
        Role::Admin => course::Model::find_all(db).await,
        Role::Teacher => course::Model::find_for_teacher(db, claims.sub).await,
        Role::Student => course::Model::find_for_student(db, claims.sub).await,
    };

    let courses = match courses {
        Ok(list) => list,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if courses.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No courses found")),
        );
    }

    match with_schedules(db, courses).await {
        Ok(out) => (
            StatusCode::OK,
            Json(ApiResponse::success(out, "Courses retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}

/// GET /api/courses/student
///
/// Courses the calling student is enrolled in.
pub async fn student_courses(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<CourseResponse>>>) {
    let db = state.db();

    let courses = match course::Model::find_for_student(db, claims.sub).await {
        Ok(list) => list,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if courses.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No courses found for this student.")),
        );
    }

    match with_schedules(db, courses).await {
        Ok(out) => (
            StatusCode::OK,
            Json(ApiResponse::success(out, "Courses retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}

/// GET /api/courses/teacher
///
/// Courses owned by the calling teacher.
pub async fn teacher_courses(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<CourseResponse>>>) {
    let db = state.db();

    let courses = match course::Model::find_for_teacher(db, claims.sub).await {
        Ok(list) => list,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if courses.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No courses found for this teacher.")),
        );
    }

    match with_schedules(db, courses).await {
        Ok(out) => (
            StatusCode::OK,
            Json(ApiResponse::success(out, "Courses retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}

/// GET /api/courses/department/{department_id}
///
/// All courses offered by a department.
pub async fn department_courses(
    State(state): State<AppState>,
    Path(department_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<CourseResponse>>>) {
    let db = state.db();

    let courses = match course::Model::find_for_department(db, department_id).await {
        Ok(list) => list,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if courses.is_empty() {
        return (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("No courses found for this department")),
        );
    }

    match with_schedules(db, courses).await {
        Ok(out) => (
            StatusCode::OK,
            Json(ApiResponse::success(out, "Courses retrieved")),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}

/// GET /api/courses/courses-by-teacher
///
/// Per-course attendance report for the calling teacher: enrolled student
/// totals plus present/absent counts grouped by lecture date.
pub async fn courses_by_teacher(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<CourseReportResponse>>>) {
    let db = state.db();

    let courses = match course::Model::find_for_teacher(db, claims.sub).await {
        Ok(list) => list,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    let mut report = Vec::with_capacity(courses.len());
    for c in courses {
        let total_students = match course_student::Model::count_for_course(db, c.id).await {
            Ok(n) => n,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Database error: {}", e))),
                );
            }
        };
        let attendance_by_date = match attendance_record::Model::per_date_counts(db, c.id).await {
            Ok(rows) => rows,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Database error: {}", e))),
                );
            }
        };
        report.push(CourseReportResponse {
            course_name: c.name,
            course_code: c.code,
            total_students,
            attendance_by_date,
        });
    }

    (
        StatusCode::OK,
        Json(ApiResponse::success(report, "Course report retrieved")),
    )
}
