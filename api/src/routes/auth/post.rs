use axum::{Json, extract::State, http::StatusCode};
use common::format_validation_errors;
use serde_json::json;
use util::state::AppState;
use validator::Validate;

use crate::auth::generate_jwt;
use crate::response::ApiResponse;

use super::common::{AuthUserResponse, LoginRequest, RegisterRequest};
use db::models::{course, course_student, department, user};

/// POST /api/auth/register
///
/// Register a new student or teacher.
///
/// Students must supply a department and a face descriptor; on success they
/// are enrolled in every course their department currently offers.
///
/// ### Responses
/// - `201 Created` with the profile and a fresh JWT
/// - `400 Bad Request` (validation failure, missing student fields, unknown department)
/// - `409 Conflict` (duplicate email)
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<ApiResponse<AuthUserResponse>>) {
    let db = state.db();

    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    if matches!(req.role, user::Role::Admin) {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Role must be student or teacher")),
        );
    }

    let is_student = matches!(req.role, user::Role::Student);
    if is_student {
        if req.department_id.is_none() {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "Department is required for student registration.",
                )),
            );
        }
        if req
            .face_descriptor
            .as_ref()
            .map(|d| d.is_empty())
            .unwrap_or(true)
        {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "Face data is required for student registration.",
                )),
            );
        }
    }

    match user::Model::find_by_email(db, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::CONFLICT,
                Json(ApiResponse::error("A user with this email already exists")),
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

    // Students join their department's full course list at registration time.
    let mut department_courses = Vec::new();
    if let Some(department_id) = req.department_id {
        match department::Model::find_by_id(db, department_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error("Invalid department.")),
                );
            }
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Database error: {}", e))),
                );
            }
        }
        if is_student {
            department_courses = match course::Model::find_for_department(db, department_id).await
            {
                Ok(courses) => courses,
                Err(e) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::error(format!("Database error: {}", e))),
                    );
                }
            };
        }
    }

    let descriptor = req.face_descriptor.as_ref().map(|d| json!(d));
    let created = user::Model::create(
        db,
        &req.first_name,
        &req.last_name,
        &req.email,
        &req.password,
        req.role.clone(),
        req.department_id,
        descriptor,
    )
    .await;

    let created = match created {
        Ok(u) => u,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    for c in &department_courses {
        if let Err(e) = course_student::Model::enroll(db, c.id, created.id).await {
            tracing::warn!(error = %e, course_id = c.id, user_id = created.id,
                "Failed to enroll new student in department course");
        }
    }

    let (token, expires_at) = generate_jwt(created.id, created.role.clone());
    (
        StatusCode::CREATED,
        Json(ApiResponse::success(
            AuthUserResponse::from_user(created, token, expires_at),
            "User registered successfully",
        )),
    )
}

/// POST /api/auth/login
///
/// Authenticate with email and password and receive a JWT.
///
/// ### Responses
/// - `200 OK` with the profile and token
/// - `401 Unauthorized` on unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<ApiResponse<AuthUserResponse>>) {
    let db = state.db();

    if let Err(validation_errors) = req.validate() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format_validation_errors(
                &validation_errors,
            ))),
        );
    }

    let user = match user::Model::find_by_email(db, &req.email).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::error("Invalid credentials.")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if !user.verify_password(&req.password) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::error("Invalid credentials.")),
        );
    }

    let (token, expires_at) = generate_jwt(user.id, user.role.clone());
    (
        StatusCode::OK,
        Json(ApiResponse::success(
            AuthUserResponse::from_user(user, token, expires_at),
            "Login successful",
        )),
    )
}
