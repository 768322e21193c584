use db::models::user::{Model as User, Role};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "First name is required"))]
    pub first_name: String,

    #[validate(length(min = 1, message = "Last name is required"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: Role,
    pub department_id: Option<i64>,
    /// Required for students; produced by the client-side embedding model.
    pub face_descriptor: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub department_id: Option<i64>,
    pub profile_picture: Option<String>,
}

/// Registration/login payload: profile plus a fresh token.
#[derive(Debug, Serialize, Default)]
pub struct AuthUserResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub unique_code: String,
    pub token: String,
    pub expires_at: String,
}

impl AuthUserResponse {
    pub fn from_user(user: User, token: String, expires_at: String) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role.to_string(),
            unique_code: user.unique_code,
            token,
            expires_at,
        }
    }
}

#[derive(Debug, Serialize, Default)]
pub struct ProfileResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: String,
    pub unique_code: String,
    pub department_id: Option<i64>,
    pub profile_picture: Option<String>,
    pub course_ids: Vec<i64>,
}

impl ProfileResponse {
    pub fn from_user(user: User, course_ids: Vec<i64>) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role.to_string(),
            unique_code: user.unique_code,
            department_id: user.department_id,
            profile_picture: user.profile_picture,
            course_ids,
        }
    }
}
