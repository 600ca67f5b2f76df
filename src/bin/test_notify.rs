use dotenv::dotenv;
use log::{error, info};

use marriott_rate_watch::services::config::ConfigStore;
use marriott_rate_watch::services::notify::HomeAssistantNotifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    info!("Testing Home Assistant notification delivery...");

    let store = ConfigStore::from_env();
    let notifier = HomeAssistantNotifier::new(store);
    if !notifier.is_configured() {
        error!("ha_url / ha_token not set in the config file");
        return Ok(());
    }

    let ok = notifier
        .send(
            "🏨 Rate Watch - Test",
            "Home Assistant notifications are working correctly!",
        )
        .await;
    if ok {
        info!("Test notification accepted by Home Assistant");
    } else {
        error!("Test notification failed; see the log lines above");
    }

    Ok(())
}
