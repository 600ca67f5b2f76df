// src/services/notify.rs
use async_trait::async_trait;
use log::{debug, error, info};
use reqwest::Client;
use serde_json::json;

use crate::models::{CheckResult, StayType};
use crate::services::config::ConfigStore;

/// Outbound notification seam. The scheduler only decides *when* to call
/// these; what the transport does with them is its own business.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// A qualifying cheaper rate appeared for one reservation.
    async fn notify_improvement(&self, result: &CheckResult);
    /// A cycle finished; called exactly once with every result.
    async fn notify_summary(&self, results: &[CheckResult]);
}

/// Pushes through Home Assistant's `notify` service with a long-lived access
/// token. Settings are re-read from the config store on every send so edits
/// apply without a restart; an unconfigured store makes every send a no-op.
pub struct HomeAssistantNotifier {
    store: ConfigStore,
}

impl HomeAssistantNotifier {
    pub fn new(store: ConfigStore) -> Self {
        HomeAssistantNotifier { store }
    }

    pub fn is_configured(&self) -> bool {
        let config = self.store.load();
        !config.ha_url.trim().is_empty() && !config.ha_token.trim().is_empty()
    }

    /// POST one notification. Returns whether Home Assistant accepted it;
    /// failures are logged, never propagated, since a lost push must not
    /// disturb the check cycle.
    pub async fn send(&self, title: &str, message: &str) -> bool {
        let config = self.store.load();
        let ha_url = config.ha_url.trim();
        let token = config.ha_token.trim();
        if ha_url.is_empty() || token.is_empty() {
            debug!("[HA] Not configured, skipping notification '{}'", title);
            return false;
        }
        let service = match config.ha_service.trim() {
            "" => "notify",
            s => s,
        };
        let url = format!(
            "{}/api/services/notify/{}",
            ha_url.trim_end_matches('/'),
            service
        );

        let client = Client::new();
        let response = client
            .post(&url)
            .bearer_auth(token)
            .json(&json!({ "title": title, "message": message }))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                info!("[HA] Notification sent: {}", title);
                true
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                let snippet: String = body.chars().take(200).collect();
                error!("[HA] Notify failed: HTTP {} - {}", status, snippet);
                false
            }
            Err(e) => {
                error!("[HA] Notify error: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for HomeAssistantNotifier {
    async fn notify_improvement(&self, result: &CheckResult) {
        let (title, message) = improvement_message(result);
        self.send(&title, &message).await;
    }

    async fn notify_summary(&self, results: &[CheckResult]) {
        let (title, message) = summary_message(results);
        self.send(&title, &message).await;
    }
}

fn format_money(currency: &str, value: f64) -> String {
    format!("{} ${:.2}", currency, value)
}

// 144000 -> "144,000"
fn format_points(points: f64) -> String {
    let negative = points < 0.0;
    let digits = format!("{:.0}", points.abs());
    let mut grouped = String::new();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-{} pts", grouped)
    } else {
        format!("{} pts", grouped)
    }
}

fn format_value(result: &CheckResult, value: f64) -> String {
    match result.stay_type {
        StayType::Cash => format_money(&result.currency, value),
        StayType::Award => format_points(value),
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// Body for a cheaper-rate alert. Callers only invoke this when the result
/// actually carries a matched room and positive savings.
pub fn improvement_message(result: &CheckResult) -> (String, String) {
    let title = format!("🏨 Cheaper rate found — {}", result.name);

    let best_name = result
        .best
        .as_ref()
        .map(|b| b.rate_name.as_str())
        .unwrap_or("Unknown rate");
    let best_value = result.best_value().unwrap_or_default();
    let reference = match result.stay_type {
        StayType::Cash => result.original_rate_per_night.unwrap_or_default(),
        StayType::Award => result.original_points_per_night.unwrap_or_default() as f64,
    };

    let mut lines = vec![best_name.to_string()];
    match &result.savings {
        Some(savings) => {
            let pct = savings
                .pct
                .map(|p| format!("↓ {:.1}%", p))
                .unwrap_or_else(|| "cheaper".to_string());
            lines.push(format!(
                "{}/night  ({} vs your {})",
                format_value(result, best_value),
                pct,
                format_value(result, reference),
            ));
            lines.push(format!(
                "Saves {}/night · {} over {} night{}",
                format_value(result, savings.diff_per_night),
                format_value(result, savings.diff_total),
                result.num_nights,
                plural(result.num_nights),
            ));
        }
        None => lines.push(format!("{}/night", format_value(result, best_value))),
    }
    lines.push(format!(
        "Check-in {}  →  {}",
        result.check_in, result.check_out
    ));

    (title, lines.join("\n"))
}

/// Summary body for a completed cycle. Lists only reservations with a
/// cheaper rate to keep the push short; a quiet cycle still reports that
/// every booked rate held up.
pub fn summary_message(results: &[CheckResult]) -> (String, String) {
    let drops: Vec<String> = results
        .iter()
        .filter(|r| r.has_improvement())
        .filter_map(|r| r.savings.as_ref().map(|savings| (r, savings)))
        .map(|(r, savings)| {
            let pct = savings
                .pct
                .map(|p| format!("↓{:.1}%", p))
                .unwrap_or_else(|| "↓".to_string());
            format!(
                "• {}: {} ({} savings)",
                r.name,
                pct,
                format_value(r, savings.diff_total)
            )
        })
        .collect();

    if drops.is_empty() {
        (
            "🏨 Rate check".to_string(),
            "All booked rates are still the best ✓".to_string(),
        )
    } else {
        (
            format!("🏨 Cheaper rates found ({})", drops.len()),
            drops.join("\n"),
        )
    }
}
