use dotenv::dotenv;
use env_logger;
use log::{info, warn};
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

mod handlers;
mod models;
mod routes;
mod services;

use services::config::ConfigStore;
use services::notify::HomeAssistantNotifier;
use services::rates::MarriottRates;
use services::scheduler::RateWatcher;

#[tokio::main]
async fn main() {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the rate watcher...");

    let port_str = env::var("PORT").unwrap_or_else(|_| {
        warn!("$PORT not set, defaulting to 8080");
        "8080".to_string()
    });
    let port: u16 = port_str.parse().expect("PORT must be a number");
    info!("Using PORT: {}", port);

    let addr: SocketAddr = ([0, 0, 0, 0], port).into();

    let store = ConfigStore::from_env();
    let notifier = Arc::new(HomeAssistantNotifier::new(store.clone()));
    let watcher = Arc::new(RateWatcher::new(
        store.clone(),
        Arc::new(MarriottRates::new()),
        notifier.clone(),
    ));

    // Background timer loop; the warp routes share the same guarded entry
    // point for manual triggers.
    tokio::spawn(Arc::clone(&watcher).run_forever());
    info!("Scheduler loop started.");

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let api = routes::routes(watcher, store, notifier).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
}
