use axum::{
    Router,
    routing::{get, post},
};
use util::state::AppState;

mod common;
mod get;
mod post;

pub use get::list_departments;
pub use post::create_department;

pub fn department_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/", get(list_departments))
        .route("/create", post(create_department))
        .with_state(app_state)
}
