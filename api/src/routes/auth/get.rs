use axum::{Extension, Json, extract::State, http::StatusCode};
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::ProfileResponse;
use db::models::{course, user};

/// GET /api/auth/profile
///
/// Returns the authenticated user's profile together with the ids of the
/// courses they are enrolled in (students) or teach (teachers).
pub async fn profile(
    State(state): State<AppState>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
) -> (StatusCode, Json<ApiResponse<ProfileResponse>>) {
    let db = state.db();

    let user = match user::Model::find_by_id(db, claims.sub).await {
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

    let courses = match user.role {
        user::Role::Student => course::Model::find_for_student(db, user.id).await,
        _ => course::Model::find_for_teacher(db, user.id).await,
    };
    let course_ids = match courses {
        Ok(list) => list.into_iter().map(|c| c.id).collect(),
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Database error: {}", e))),
            );
        }
    };

    (
        StatusCode::OK,
        Json(ApiResponse::success(
            ProfileResponse::from_user(user, course_ids),
            "Profile retrieved",
        )),
    )
}
