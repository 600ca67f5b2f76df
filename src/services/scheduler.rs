// src/services/scheduler.rs
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{error, info, warn};

use crate::models::{CheckResult, Reservation, RunStatus, StatusSnapshot};
use crate::services::compare;
use crate::services::config::{AppConfig, ConfigStore, MIN_SCHEDULE_HOURS};
use crate::services::normalize;
use crate::services::notify::Notifier;
use crate::services::rates::RateSource;

// Delay before the first automatic cycle so the HTTP server is up before
// the first fetch starts.
const STARTUP_DELAY: Duration = Duration::from_secs(5);

struct WatcherState {
    status: RunStatus,
    last_run: Option<DateTime<Utc>>,
    next_check: Option<DateTime<Utc>>,
    schedule_hours: f64,
    /// Latest result per reservation key; overwritten as each reservation
    /// finishes, never appended.
    results: HashMap<String, CheckResult>,
    /// Reservation keys in the order the last cycle processed them.
    order: Vec<String>,
    /// Best value already alerted per reservation, for idempotent alerting.
    notified: HashMap<String, f64>,
}

/// Drives the whole pipeline: on every trigger it walks the configured
/// reservations through fetch → normalize → dedupe → match → compare,
/// records each result, and raises notifications.
///
/// This is the only writer of the schedule/result state; routes and the
/// status page read snapshots of it.
pub struct RateWatcher {
    store: ConfigStore,
    source: Arc<dyn RateSource>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<WatcherState>,
}

impl RateWatcher {
    pub fn new(store: ConfigStore, source: Arc<dyn RateSource>, notifier: Arc<dyn Notifier>) -> Self {
        let schedule_hours = store.load().schedule_hours.max(MIN_SCHEDULE_HOURS);
        RateWatcher {
            store,
            source,
            notifier,
            state: Mutex::new(WatcherState {
                status: RunStatus::Idle,
                last_run: None,
                next_check: None,
                schedule_hours,
                results: HashMap::new(),
                order: Vec::new(),
                notified: HashMap::new(),
            }),
        }
    }

    fn locked(&self) -> MutexGuard<'_, WatcherState> {
        // A poisoned lock only means a cycle panicked mid-update; the state
        // itself is still structurally sound.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.locked().status == RunStatus::Checking
    }

    /// Point-in-time copy of the schedule state and latest results.
    pub fn status(&self) -> StatusSnapshot {
        let state = self.locked();
        let results = state
            .order
            .iter()
            .filter_map(|key| state.results.get(key).cloned())
            .collect();
        StatusSnapshot {
            status: state.status,
            last_run: state.last_run,
            next_check: state.next_check,
            schedule_hours: state.schedule_hours,
            results,
        }
    }

    /// The single guarded entry shared by the timer and the manual trigger.
    /// Returns false when a cycle is already in flight; the in-flight cycle
    /// is neither duplicated nor disturbed.
    pub fn try_begin_cycle(&self) -> bool {
        let mut state = self.locked();
        if state.status == RunStatus::Checking {
            return false;
        }
        state.status = RunStatus::Checking;
        true
    }

    /// Manual-trigger path: claim the guard and run the cycle on a
    /// background task. Returns false (and spawns nothing) when busy.
    pub fn spawn_check(self: Arc<Self>) -> bool {
        if !self.try_begin_cycle() {
            return false;
        }
        tokio::spawn(async move { self.run_cycle().await });
        true
    }

    /// Claim the guard and run a full cycle inline. Returns false when a
    /// cycle was already running.
    pub async fn check_now(&self) -> bool {
        if !self.try_begin_cycle() {
            return false;
        }
        self.run_cycle().await;
        true
    }

    /// Execute one full cycle. The caller must have claimed the guard via
    /// `try_begin_cycle`; the guard is released when the cycle completes.
    ///
    /// Reservations are checked independently: a fetch or parse failure is
    /// recorded on that reservation's result and the loop moves on. The
    /// interval in effect when the cycle started is the one used to compute
    /// the next trigger time.
    pub async fn run_cycle(&self) {
        let config = self.store.load();
        let interval_hours = config.schedule_hours.max(MIN_SCHEDULE_HOURS);
        info!(
            "Starting check cycle for {} reservation(s)",
            config.hotels.len()
        );

        let mut cycle_results = Vec::with_capacity(config.hotels.len());
        let mut order = Vec::with_capacity(config.hotels.len());

        for reservation in &config.hotels {
            let result = self.check_reservation(&config, reservation).await;
            let key = reservation.key();

            let should_alert = {
                let mut state = self.locked();
                let alert = update_notify_ledger(&mut state.notified, &key, &result);
                state.results.insert(key.clone(), result.clone());
                alert
            };
            if should_alert {
                info!("[{}] Cheaper rate, sending alert", result.name);
                self.notifier.notify_improvement(&result).await;
            }

            order.push(key);
            cycle_results.push(result);
        }

        self.notifier.notify_summary(&cycle_results).await;

        let finished = Utc::now();
        let mut state = self.locked();
        state.status = RunStatus::Idle;
        state.last_run = Some(finished);
        state.schedule_hours = interval_hours;
        state.next_check =
            Some(finished + chrono::Duration::seconds((interval_hours * 3600.0) as i64));
        state.order = order;
        let WatcherState {
            results,
            notified,
            order,
            ..
        } = &mut *state;
        results.retain(|key, _| order.contains(key));
        notified.retain(|key, _| order.contains(key));
        info!("Check cycle complete");
    }

    async fn check_reservation(
        &self,
        config: &AppConfig,
        reservation: &Reservation,
    ) -> CheckResult {
        let label = reservation.display_name();
        match self
            .source
            .fetch_rates(reservation, &config.browser_cookies)
            .await
        {
            Ok(records) => {
                let rooms = normalize::dedupe_rooms(normalize::normalize_records(records));
                info!("[{}] {} distinct rate/room combinations", label, rooms.len());
                compare::build_check_result(reservation, &rooms, Utc::now())
            }
            Err(e) => {
                error!("[{}] Check failed: {}", label, e);
                CheckResult::from_error(reservation, e.to_string(), Utc::now())
            }
        }
    }

    /// Background timer loop. Re-reads the interval after every cycle, so a
    /// changed schedule takes effect at the next boundary; a cycle that is
    /// somehow still running when the timer fires is left alone.
    pub async fn run_forever(self: Arc<Self>) {
        tokio::time::sleep(STARTUP_DELAY).await;
        loop {
            let config = self.store.load();
            if config.hotels.is_empty() {
                info!("No reservations configured, skipping scheduled check");
            } else if !self.check_now().await {
                warn!("Timer fired while a cycle is still running, skipping");
            }
            let hours = self.store.load().schedule_hours.max(MIN_SCHEDULE_HOURS);
            tokio::time::sleep(Duration::from_secs_f64(hours * 3600.0)).await;
        }
    }
}

/// Decide whether this result warrants an improvement alert, updating the
/// ledger as a side effect.
///
/// The rule: alert on the transition into "improvement found", and again
/// only when the best value is strictly better than the one last alerted.
/// An unchanged (or worse-but-still-positive) improvement stays quiet. A
/// cycle without an improvement clears the ledger so a reappearance alerts
/// again.
fn update_notify_ledger(
    notified: &mut HashMap<String, f64>,
    key: &str,
    result: &CheckResult,
) -> bool {
    if !result.has_improvement() {
        notified.remove(key);
        return false;
    }
    let Some(best_value) = result.best_value() else {
        return false;
    };
    match notified.get(key) {
        Some(&previous) if best_value >= previous => false,
        _ => {
            notified.insert(key.to_string(), best_value);
            true
        }
    }
}
