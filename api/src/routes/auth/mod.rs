use axum::{
    Router,
    middleware::from_fn,
    routing::{get, post},
};
use util::state::AppState;

mod common;
mod get;
mod post;
mod put;

pub use get::profile;
pub use post::{login, register};
pub use put::update_profile;

use crate::auth::guards::allow_authenticated;

pub fn auth_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route(
            "/profile",
            get(profile)
                .put(update_profile)
                .route_layer(from_fn(allow_authenticated)),
        )
        .with_state(app_state)
}
