use axum::{
    Router,
    middleware::from_fn,
    routing::{delete, get, post, put},
};
use util::state::AppState;

mod common;
mod delete;
mod get;
mod post;
mod put;

pub use delete::delete_course;
pub use get::{courses_by_teacher, department_courses, list_courses, student_courses, teacher_courses};
pub use post::{create_course, register_courses};
pub use put::update_course;

use crate::auth::guards::{allow_authenticated, require_teacher};

pub fn course_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(list_courses))
        .route("/student", get(student_courses))
        .route("/teacher", get(teacher_courses))
        .route(
            "/courses-by-teacher",
            get(courses_by_teacher).route_layer(from_fn(require_teacher)),
        )
        .route("/department/{department_id}", get(department_courses))
        .route(
            "/create",
            post(create_course).route_layer(from_fn(require_teacher)),
        )
        .route("/register", post(register_courses))
        .route(
            "/update/{course_id}",
            put(update_course).route_layer(from_fn(require_teacher)),
        )
        .route(
            "/delete/{course_id}",
            delete(delete_course).route_layer(from_fn(require_teacher)),
        )
        .route_layer(from_fn(allow_authenticated))
        .with_state(app_state)
}
