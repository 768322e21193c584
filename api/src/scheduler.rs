//! Background expiry sweep for attendance sessions and records.
//!
//! One global recurring task, not per-session timers: every tick re-derives
//! all pending work from the store, so a restart or a failed tick loses
//! nothing. Both sweeps are conditional updates that skip already-resolved
//! rows, making each tick idempotent and safe to run concurrently with
//! request handling.

use chrono::Utc;
use db::models::{attendance_record, attendance_session};
use std::time::Duration;
use util::{config, state::AppState};

pub fn spawn_expiry_scheduler(app_state: AppState) {
    let interval = Duration::from_secs(config::expiry_sweep_seconds().max(1));
    let db = app_state.db_clone();

    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let now = Utc::now();

            // Sessions past their end time go inactive first, then any
            // still-pending records for closed sessions default to absent.
            match attendance_session::Model::expire_overdue(&db, now).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(sessions = n, "Deactivated expired attendance sessions"),
                Err(e) => {
                    tracing::error!(error = %e, "Session expiry sweep failed; retrying next tick");
                    continue;
                }
            }

            match attendance_record::Model::absent_overdue(&db, now).await {
                Ok(0) => {}
                Ok(n) => {
                    tracing::info!(records = n, "Marked pending records absent for closed sessions")
                }
                Err(e) => {
                    tracing::error!(error = %e, "Auto-absent sweep failed; retrying next tick")
                }
            }
        }
    });
}
