use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post, put},
};
use util::state::AppState;

mod common;
mod get;
mod post;
mod put;

pub use get::{
    attendance_summary, attendance_summary_student, student_course_attendance, student_history,
    teacher_history, total_courses,
};
pub use post::create_session;
pub use put::mark_attendance;

use crate::auth::guards::{allow_authenticated, require_teacher};

pub fn attendance_routes(app_state: AppState) -> Router {
    Router::new()
        .route(
            "/total-courses",
            get(total_courses).route_layer(from_fn(require_teacher)),
        )
        .route(
            "/attendance-summary",
            get(attendance_summary).route_layer(from_fn(require_teacher)),
        )
        .route("/attendance-summary/student", get(attendance_summary_student))
        .route(
            "/create/{course_id}",
            post(create_session).route_layer(from_fn(require_teacher)),
        )
        .route("/mark/{session_identifier}", put(mark_attendance))
        .route("/student/history", get(student_history))
        .route("/student/{course_id}", get(student_course_attendance))
        .route(
            "/teacher/history/{course_id}",
            get(teacher_history).route_layer(from_fn(require_teacher)),
        )
        .route_layer(from_fn(allow_authenticated))
        .with_state(app_state)
}
