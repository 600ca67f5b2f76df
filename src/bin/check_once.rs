use std::sync::Arc;

use dotenv::dotenv;
use log::{error, info};

use marriott_rate_watch::services::config::ConfigStore;
use marriott_rate_watch::services::notify::HomeAssistantNotifier;
use marriott_rate_watch::services::rates::MarriottRates;
use marriott_rate_watch::services::scheduler::RateWatcher;

/// Run one full check cycle outside the scheduler, with real fetches and
/// real notifications, and dump each reservation's outcome.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let store = ConfigStore::from_env();
    if store.load().hotels.is_empty() {
        error!("No reservations configured; add one to the config file first");
        return Ok(());
    }

    let notifier = Arc::new(HomeAssistantNotifier::new(store.clone()));
    let watcher = RateWatcher::new(store, Arc::new(MarriottRates::new()), notifier);

    info!("Running one check cycle...");
    watcher.check_now().await;

    for result in watcher.status().results {
        if result.had_error {
            error!(
                "{}: check failed ({})",
                result.name,
                result.error.unwrap_or_default()
            );
            continue;
        }
        match (&result.best, &result.savings) {
            (Some(best), Some(savings)) => {
                info!(
                    "{}: best '{}' at {:?}/{:?} per night, diff {:.2}/night ({:.2} total)",
                    result.name,
                    best.rate_name,
                    best.price_per_night,
                    best.points_per_night,
                    savings.diff_per_night,
                    savings.diff_total
                );
            }
            (Some(best), None) => {
                info!(
                    "{}: best '{}' found but no reference value to compare against",
                    result.name, best.rate_name
                );
            }
            _ => info!("{}: no rate matched the filters", result.name),
        }
    }

    Ok(())
}
