use axum::Router;
use db::test_utils::setup_test_db;
use util::{config::AppConfig, state::AppState};

/// Builds the full `/api` router over a fresh in-memory database.
///
/// The JWT secret is pinned so tokens minted with `api::auth::generate_jwt`
/// verify inside handlers.
pub async fn make_test_app() -> (Router, AppState) {
    AppConfig::set_jwt_secret("integration-test-secret");
    AppConfig::set_jwt_duration_minutes(60u64);

    let db = setup_test_db().await;
    let app_state = AppState::new(db);
    let app = Router::new().nest("/api", api::routes::routes(app_state.clone()));
    (app, app_state)
}
