use axum::{
    Extension, Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::Utc;
use util::state::AppState;

use crate::auth::AuthUser;
use crate::response::ApiResponse;

use super::common::{MarkAttendanceRequest, MarkAttendanceResponse};
use db::models::{
    attendance_record::{self, IdentifyError, MarkError, VerificationMethod},
    attendance_session,
};

/// PUT /api/attendance/mark/{session_identifier}
///
/// Marks one student present for an open session.
///
/// Two paths share this endpoint:
/// - body with a `descriptor` array: the probe is matched against the
///   session's pending records and the identified student is marked
///   (method `face`);
/// - empty body: the caller marks themselves (method `manual`).
///
/// The transition itself is one-shot: a record that has already left
/// `pending` is never overwritten, whichever path attempts it.
pub async fn mark_attendance(
    State(state): State<AppState>,
    Path(session_identifier): Path<String>,
    Extension(AuthUser(claims)): Extension<AuthUser>,
    body: Bytes,
) -> (StatusCode, Json<ApiResponse<MarkAttendanceResponse>>) {
    let db = state.db();
    let now = Utc::now();

    // The body is optional: absent (or empty) means a manual self-mark.
    let descriptor = if body.is_empty() {
        None
    } else {
        match serde_json::from_slice::<MarkAttendanceRequest>(&body) {
            Ok(req) => req.descriptor,
            Err(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(ApiResponse::error("Invalid request body")),
                );
            }
        }
    };

    let session =
        match attendance_session::Model::find_by_identifier(db, &session_identifier).await {
            Ok(Some(s)) => s,
            Ok(None) => {
                return (
                    StatusCode::NOT_FOUND,
                    Json(ApiResponse::error("Session not found")),
                );
            }
            Err(e) => {
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiResponse::error(format!("Database error: {}", e))),
                );
            }
        };

    if !session.is_open_at(now) {
        return (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Attendance session is not active or out of allowed timeframe",
            )),
        );
    }

    let (student_id, method) = match descriptor {
        Some(probe) => {
            match attendance_record::Model::identify(db, session.id, &probe).await {
                Ok(Some(student_id)) => (student_id, VerificationMethod::Face),
                Ok(None) => {
                    return (
                        StatusCode::NOT_FOUND,
                        Json(ApiResponse::error(
                            "No matching student for the supplied face descriptor",
                        )),
                    );
                }
                Err(IdentifyError::Dimension(e)) => {
                    return (
                        StatusCode::BAD_REQUEST,
                        Json(ApiResponse::error(e.to_string())),
                    );
                }
                Err(IdentifyError::Db(e)) => {
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(ApiResponse::error(format!("Database error: {}", e))),
                    );
                }
            }
        }
        None => (claims.sub, VerificationMethod::Manual),
    };

    match attendance_record::Model::mark_present(db, &session, student_id, method.clone(), now)
        .await
    {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::success(
                MarkAttendanceResponse {
                    student_id,
                    verification_method: method.to_string(),
                },
                "Attendance marked successfully",
            )),
        ),
        Err(MarkError::SessionClosed) => (
            StatusCode::FORBIDDEN,
            Json(ApiResponse::error(
                "Attendance session is not active or out of allowed timeframe",
            )),
        ),
        Err(MarkError::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::error("Attendance record not found")),
        ),
        Err(MarkError::AlreadyMarked) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error("Attendance already marked")),
        ),
        Err(MarkError::Db(e)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::error(format!(
                "Failed to mark attendance: {e}"
            ))),
        ),
    }
}
