// src/handlers/check.rs
use std::sync::Arc;

use log::info;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::config::ConfigStore;
use crate::services::scheduler::RateWatcher;

/// Manual "check now" trigger. Shares the scheduler's guard with the timer:
/// while a cycle is running this is a 409 no-op, never a second cycle.
pub async fn start_check(
    watcher: Arc<RateWatcher>,
    store: ConfigStore,
) -> Result<Json, Rejection> {
    if watcher.is_running() {
        return Err(warp::reject::custom(ApiError::conflict(
            "A check is already running",
        )));
    }
    if store.load().hotels.is_empty() {
        return Err(warp::reject::custom(ApiError::bad_request(
            "No reservations configured",
        )));
    }
    if !watcher.spawn_check() {
        return Err(warp::reject::custom(ApiError::conflict(
            "A check is already running",
        )));
    }
    info!("Manual check triggered");
    Ok(warp::reply::json(&serde_json::json!({ "ok": true })))
}
