// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::info;
use warp::reject::Rejection;
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::{check, config, notify, status};
use crate::services::config::ConfigStore;
use crate::services::notify::HomeAssistantNotifier;
use crate::services::scheduler::RateWatcher;

// Render rejections as a JSON error body with the right status code.
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(
    watcher: Arc<RateWatcher>,
    store: ConfigStore,
    notifier: Arc<HomeAssistantNotifier>,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let watcher_filter = warp::any().map(move || watcher.clone());
    let store_filter = warp::any().map(move || store.clone());
    let notifier_filter = warp::any().map(move || notifier.clone());

    let status_route = warp::path!("api" / "v1" / "status")
        .and(warp::get())
        .and(watcher_filter.clone())
        .and_then(status::get_status);

    let check_route = warp::path!("api" / "v1" / "check")
        .and(warp::post())
        .and(watcher_filter.clone())
        .and(store_filter.clone())
        .and_then(check::start_check);

    let get_config_route = warp::path!("api" / "v1" / "config")
        .and(warp::get())
        .and(store_filter.clone())
        .and_then(config::get_config);

    let save_config_route = warp::path!("api" / "v1" / "config")
        .and(warp::post())
        .and(warp::body::content_length_limit(1024 * 64))
        .and(warp::body::json())
        .and(store_filter.clone())
        .and_then(config::save_config);

    let notify_test_route = warp::path!("api" / "v1" / "notify" / "test")
        .and(warp::post())
        .and(notifier_filter.clone())
        .and_then(notify::test_notification);

    info!("All routes configured successfully.");

    status_route
        .or(check_route)
        .or(get_config_route)
        .or(save_config_route)
        .or(notify_test_route)
        .recover(handle_rejection)
}
