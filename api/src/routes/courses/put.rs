use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::{CourseResponse, UpdateCourseRequest};
use db::models::{course, course_schedule_slot};

/// PUT /api/courses/update/{course_id}
///
/// Updates course fields; when a schedule is supplied the existing slots are
/// replaced wholesale. Only the owning teacher (or an admin) may update.
pub async fn update_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<UpdateCourseRequest>,
) -> (StatusCode, Json<ApiResponse<CourseResponse>>) {
    let db = state.db();

    let existing = match course::Model::find_by_id(db, course_id).await {
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
            Json(ApiResponse::error("Not authorized to update this course")),
        );
    }

    // Resolve replacement slots up front so a bad weekday writes nothing.
    let replacement_slots = match &req.schedule {
        Some(entries) => {
            let mut slots: Vec<(i16, Option<String>, Option<String>)> = Vec::new();
            for entry in entries {
                let Some(weekday) = course_schedule_slot::weekday_index_from_name(&entry.day)
                else {
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
            Some(slots)
        }
        None => None,
    };

    let mut active: course::ActiveModel = existing.into();
    if let Some(name) = req.name {
        active.name = Set(name);
    }
    if let Some(semester_start) = req.semester_start {
        active.semester_start = Set(semester_start);
    }
    if let Some(semester_months) = req.semester_months {
        active.semester_months = Set(semester_months);
    }
    active.updated_at = Set(Utc::now());

    let updated = match active.update(db).await {
        Ok(c) => c,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if let Some(slots) = replacement_slots {
        let wipe = course_schedule_slot::Entity::delete_many()
            .filter(course_schedule_slot::Column::CourseId.eq(updated.id))
            .exec(db)
            .await;
        if let Err(e) = wipe {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
        for (weekday, start, end) in slots {
            if let Err(e) = course_schedule_slot::Model::create(
                db,
                updated.id,
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
    }

    let slots = course_schedule_slot::Model::for_course(db, updated.id)
        .await
        .unwrap_or_default();
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            CourseResponse::from_with_schedule(updated, slots),
            "Course updated successfully",
        )),
    )
}
