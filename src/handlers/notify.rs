// src/handlers/notify.rs
use std::sync::Arc;

use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::notify::HomeAssistantNotifier;

/// Fire a test push so the operator can confirm their Home Assistant
/// settings before trusting the real alerts.
pub async fn test_notification(
    notifier: Arc<HomeAssistantNotifier>,
) -> Result<Json, Rejection> {
    if !notifier.is_configured() {
        return Err(warp::reject::custom(ApiError::bad_request(
            "Home Assistant URL or token not configured",
        )));
    }
    let ok = notifier
        .send(
            "🏨 Rate Watch - Test",
            "Home Assistant notifications are working correctly!",
        )
        .await;
    let error = if ok { None } else { Some("Check logs for details") };
    Ok(warp::reply::json(&serde_json::json!({
        "ok": ok,
        "error": error,
    })))
}
