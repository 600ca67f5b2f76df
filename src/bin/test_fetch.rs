use dotenv::dotenv;
use log::{error, info};

use marriott_rate_watch::services::config::ConfigStore;
use marriott_rate_watch::services::normalize;
use marriott_rate_watch::services::rates::{MarriottRates, RateSource};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("Testing rate fetch against the live booking API...");

    let store = ConfigStore::from_env();
    let config = store.load();
    if config.hotels.is_empty() {
        error!("No reservations configured; add one to the config file first");
        return Ok(());
    }

    let source = MarriottRates::new();
    for reservation in &config.hotels {
        info!("Fetching rates for {}...", reservation.display_name());
        match source.fetch_rates(reservation, &config.browser_cookies).await {
            Ok(records) => {
                info!("{} raw records", records.len());
                let rooms = normalize::dedupe_rooms(normalize::normalize_records(records));
                info!("{} distinct rate/room combinations", rooms.len());

                let mut cash: Vec<_> =
                    rooms.iter().filter(|r| r.price_per_night.is_some()).collect();
                cash.sort_by(|a, b| {
                    a.price_per_night
                        .partial_cmp(&b.price_per_night)
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
                for room in cash.iter().take(5) {
                    info!(
                        "  {} ${:.2} - {} ({})",
                        room.currency,
                        room.price_per_night.unwrap_or_default(),
                        room.rate_name,
                        room.room_type_name
                    );
                }

                let mut award: Vec<_> =
                    rooms.iter().filter(|r| r.points_per_night.is_some()).collect();
                award.sort_by_key(|r| r.points_per_night);
                for room in award.iter().take(3) {
                    info!(
                        "  {} pts - {} ({})",
                        room.points_per_night.unwrap_or_default(),
                        room.rate_name,
                        room.room_type_name
                    );
                }
            }
            Err(e) => error!("Fetch failed for {}: {}", reservation.display_name(), e),
        }
    }

    Ok(())
}
