use axum::{Extension, Json, extract::State, http::StatusCode};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::{ProfileResponse, UpdateProfileRequest};
use db::models::user;

/// PUT /api/auth/profile
///
/// Partially updates the authenticated user's profile. Only supplied fields
/// change; a supplied password is re-hashed before storage.
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> (StatusCode, Json<ApiResponse<ProfileResponse>>) {
    let db = state.db();

    let existing = match user::Model::find_by_id(db, claims.sub).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error("User not found.")),
            );
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    if let Some(email) = req.email.as_deref() {
        if email != existing.email {
            match user::Model::find_by_email(db, email).await {
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
        }
    }

    let mut active: user::ActiveModel = existing.into();
    if let Some(first_name) = req.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = req.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = req.email {
        active.email = Set(email);
    }
    if let Some(department_id) = req.department_id {
        active.department_id = Set(Some(department_id));
    }
    if let Some(profile_picture) = req.profile_picture {
        active.profile_picture = Set(Some(profile_picture));
    }
    if let Some(password) = req.password {
        let hash = match user::Model::hash_password(&password) {
            Ok(h) => h,
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Database error: {}", e))),
                );
            }
        };
        active.password_hash = Set(hash);
    }
    active.updated_at = Set(Utc::now());

    match active.update(db).await {
        Ok(updated) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                ProfileResponse::from_user(updated, Vec::new()),
                "Profile updated successfully",
            )),
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!("Database error: {}", e))),
        ),
    }
}
