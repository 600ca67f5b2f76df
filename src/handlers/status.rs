// src/handlers/status.rs
use std::sync::Arc;

use warp::reply::Json;
use warp::Rejection;

use crate::services::scheduler::RateWatcher;

/// Schedule state plus the latest result per reservation.
pub async fn get_status(watcher: Arc<RateWatcher>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&watcher.status()))
}
