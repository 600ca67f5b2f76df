// src/handlers/config.rs
use log::error;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::config::{self, AppConfig, ConfigStore};

pub async fn get_config(store: ConfigStore) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&store.load()))
}

/// Validate and persist a full config document. The running scheduler picks
/// the changes up at its next cycle boundary; nothing is hot-swapped.
pub async fn save_config(new_config: AppConfig, store: ConfigStore) -> Result<Json, Rejection> {
    if let Err(message) = config::validate(&new_config) {
        return Err(warp::reject::custom(ApiError::bad_request(message)));
    }
    store.save(&new_config).map_err(|e| {
        error!("Failed to save config: {}", e);
        warp::reject::custom(ApiError::new(e.to_string()))
    })?;
    Ok(warp::reply::json(&serde_json::json!({ "ok": true })))
}
