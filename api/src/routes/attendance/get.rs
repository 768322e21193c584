use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::{
    AttendanceSummaryResponse, StudentAttendanceEntry, StudentCourseAttendanceResponse,
    StudentHistoryEntry, StudentSummaryResponse, TeacherHistoryEntry, TotalCoursesResponse,
};
use db::models::{
    attendance_record::{Column as RecordCol, Entity as RecordEntity, Status},
    attendance_session, course, course_student, user,
};

/// GET /api/attendance/student/{course_id}
///
/// The calling student's attendance entries for one course, with session
/// liveness flags.
pub async fn student_course_attendance(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<StudentCourseAttendanceResponse>>) {
    let db = state.db();

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

    match course_student::Model::is_enrolled(db, course_id, claims.sub).await {
        Ok(true) => {}
        Ok(false) => {
            return (
                StatusCode::FORBIDDEN,
                Json(ApiResponse::error("You are not enrolled in this course")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    }

    let rows = RecordEntity::find()
        .filter(RecordCol::StudentId.eq(claims.sub))
        .filter(RecordCol::CourseId.eq(course_id))
        .find_also_related(attendance_session::Entity)
        .order_by_asc(RecordCol::LectureDate)
        .all(db)
        .await;

    let rows = match rows {
        Ok(r) => r,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    format!("Failed to fetch attendance details: {e}"),
                )),
            );
        }
    };

    let now = Utc::now();
    let attendance_list = rows
        .into_iter()
        .map(|(record, session)| {
            let (is_active, is_within_timeframe) = session
                .map(|s| (s.active, now >= s.start_time && now <= s.end_time))
                .unwrap_or((false, false));
            StudentAttendanceEntry {
                lecture_date: Some(record.lecture_date),
                status: record.status.to_string(),
                is_active,
                is_within_timeframe,
            }
        })
        .collect();

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            StudentCourseAttendanceResponse {
                course_name: course.name,
                course_code: course.code,
                attendance_list,
            },
            "Attendance details retrieved",
        )),
    )
}

/// GET /api/attendance/student/history
///
/// The calling student's full attendance history across courses, newest
/// lecture first.
pub async fn student_history(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<Vec<StudentHistoryEntry>>>) {
    let db = state.db();

    let rows = RecordEntity::find()
        .filter(RecordCol::StudentId.eq(claims.sub))
        .find_also_related(course::Entity)
        .order_by_desc(RecordCol::LectureDate)
        .all(db)
        .await;

    match rows {
        Ok(rows) => {
            let history = rows
                .into_iter()
                .map(|(record, course)| {
                    let (course_name, course_code) = course
                        .map(|c| (c.name, c.code))
                        .unwrap_or_default();
                    StudentHistoryEntry {
                        course_name,
                        course_code,
                        lecture_date: Some(record.lecture_date),
                        status: record.status.to_string(),
                    }
                })
                .collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(history, "Attendance history retrieved")),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}

/// GET /api/attendance/teacher/history/{course_id}
///
/// Per-student attendance history for one course, newest lecture first.
pub async fn teacher_history(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> (StatusCode, Json<ApiResponse<Vec<TeacherHistoryEntry>>>) {
    let db = state.db();

    let rows = RecordEntity::find()
        .filter(RecordCol::CourseId.eq(course_id))
        .find_also_related(user::Entity)
        .order_by_desc(RecordCol::LectureDate)
        .all(db)
        .await;

    match rows {
        Ok(rows) => {
            let history = rows
                .into_iter()
                .map(|(record, student)| {
                    let student_name = student
                        .map(|s| format!("{} {}", s.first_name, s.last_name))
                        .unwrap_or_default();
                    TeacherHistoryEntry {
                        lecture_date: Some(record.lecture_date),
                        student_name,
                        status: record.status.to_string(),
                    }
                })
                .collect();
            (
                StatusCode::OK,
                Json(ApiResponse::success(history, "Attendance history retrieved")),
            )
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}

/// GET /api/attendance/attendance-summary
///
/// Present/absent totals across every course the calling teacher owns.
pub async fn attendance_summary(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<AttendanceSummaryResponse>>) {
    let db = state.db();

    let present = db::models::attendance_record::Model::count_by_status_for_teacher(
        db,
        claims.sub,
        Status::Present,
    )
    .await;
    let absent = db::models::attendance_record::Model::count_by_status_for_teacher(
        db,
        claims.sub,
        Status::Absent,
    )
    .await;

    match (present, absent) {
        (Ok(total_present), Ok(total_absent)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                AttendanceSummaryResponse {
                    total_present,
                    total_absent,
                },
                "Attendance summary retrieved",
            )),
        ),
        (Err(e), _) | (_, Err(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Error fetching attendance summary: {e}"
            ))),
        ),
    }
}

/// GET /api/attendance/attendance-summary/student
///
/// Per-status totals for the calling student across all enrolled courses.
pub async fn attendance_summary_student(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<StudentSummaryResponse>>) {
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
            Json(ApiResponse::error("No courses found for this student")),
        );
    }

    use db::models::attendance_record::Model as Record;
    let totals = tokio::try_join!(
        Record::count_for_student(db, claims.sub),
        Record::count_by_status_for_student(db, claims.sub, Status::Present),
        Record::count_by_status_for_student(db, claims.sub, Status::Absent),
        Record::count_by_status_for_student(db, claims.sub, Status::Late),
    );

    match totals {
        Ok((total_classes, total_present, total_absent, total_late)) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                StudentSummaryResponse {
                    total_classes,
                    total_present,
                    total_absent,
                    total_late,
                },
                "Attendance summary retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Error fetching attendance summary: {e}"
            ))),
        ),
    }
}

/// GET /api/attendance/total-courses
///
/// Number of courses owned by the calling teacher.
pub async fn total_courses(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<TotalCoursesResponse>>) {
    match course::Model::count_for_teacher(state.db(), claims.sub).await {
        Ok(total_courses) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                TotalCoursesResponse { total_courses },
                "Course count retrieved",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}
