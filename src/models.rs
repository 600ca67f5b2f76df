// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, NaiveDate, Utc};

/// How a reservation is priced: in currency or in loyalty points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StayType {
    #[default]
    Cash,
    Award,
}

/// Which cancellation category the booked rate belongs to. Rates are only
/// compared like-for-like against this category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CancellationType {
    #[default]
    Any,
    Refundable,
    Nonrefundable,
}

impl CancellationType {
    pub fn label(&self) -> &'static str {
        match self {
            CancellationType::Any => "Any",
            CancellationType::Refundable => "Refundable only",
            CancellationType::Nonrefundable => "Non-refundable only",
        }
    }
}

fn default_adults() -> u32 {
    2
}

fn default_num_rooms() -> u32 {
    1
}

fn default_currency() -> String {
    "CAD".to_string()
}

/// One monitored reservation, as configured by the operator. Read-only to the
/// checking pipeline; a cycle always sees the value that was loaded when it
/// started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    #[serde(default)]
    pub name: String,
    pub property_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default = "default_adults")]
    pub adults: u32,
    #[serde(default = "default_num_rooms")]
    pub num_rooms: u32,
    #[serde(default)]
    pub stay_type: StayType,
    /// Booked nightly rate for cash stays.
    #[serde(default)]
    pub original_rate_per_night: Option<f64>,
    /// Booked nightly points for award stays.
    #[serde(default)]
    pub original_points_per_night: Option<i64>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub cancellation_type: CancellationType,
    /// Restrict matching to a single room type code (e.g. "SUIT").
    #[serde(default)]
    pub room_type: Option<String>,
}

impl Reservation {
    pub fn display_name(&self) -> String {
        if self.name.trim().is_empty() {
            self.property_code.to_uppercase()
        } else {
            self.name.clone()
        }
    }

    /// Stable identity used for the latest-result map and the notification
    /// ledger.
    pub fn key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.property_code.to_uppercase(),
            self.check_in,
            self.check_out
        )
    }

    /// Number of nights in the stay; the checkout date is exclusive.
    pub fn num_nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days().max(0)
    }

    /// The booked reference value in the unit selected by the stay type.
    /// Points are widened to f64 so savings math is uniform across modes.
    pub fn reference_value(&self) -> Option<f64> {
        match self.stay_type {
            StayType::Cash => self.original_rate_per_night,
            StayType::Award => self.original_points_per_night.map(|p| p as f64),
        }
    }
}

/// A room/rate offer after normalization. Exactly one of `price_per_night`
/// and `points_per_night` is set; records with neither are dropped upstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRoom {
    pub rate_name: String,
    pub room_type_code: String,
    pub room_type_name: String,
    pub room_description: String,
    pub rate_plan_code: String,
    pub market_code: String,
    pub price_per_night: Option<f64>,
    pub points_per_night: Option<i64>,
    pub currency: String,
    pub is_members_only: bool,
    pub deposit_required: bool,
    pub free_cancellation_until: Option<String>,
    /// Tri-state: `None` means the upstream gave no signal either way.
    pub is_refundable: Option<bool>,
}

impl NormalizedRoom {
    /// The room's value in the unit relevant to the given stay type, or
    /// `None` when the room is priced in the other mode.
    pub fn value_for(&self, stay_type: StayType) -> Option<f64> {
        match stay_type {
            StayType::Cash => self.price_per_night,
            StayType::Award => self.points_per_night.map(|p| p as f64),
        }
    }

    /// The room's value in its own pricing mode.
    pub fn own_value(&self) -> Option<f64> {
        self.price_per_night
            .or_else(|| self.points_per_night.map(|p| p as f64))
    }
}

/// Savings of a candidate rate against the booked reference value, per night
/// and over the whole stay. Negative numbers mean the candidate is worse;
/// still reported, since hiding them is a display decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Savings {
    pub diff_per_night: f64,
    /// Absent when the reference value is zero or missing.
    pub pct: Option<f64>,
    pub diff_total: f64,
}

/// Best rate found in a cancellation category other than the reservation's
/// own, so the operator can see what switching category would cost or save.
#[derive(Debug, Clone, Serialize)]
pub struct AltBest {
    pub label: &'static str,
    pub cancellation_type: CancellationType,
    pub rate_name: String,
    pub room_type_name: String,
    pub value: f64,
    pub savings: Option<Savings>,
}

/// One row of the deduplicated rate table, annotated with savings when the
/// row is priced in the reservation's mode and a reference value exists.
#[derive(Debug, Clone, Serialize)]
pub struct RateRow {
    #[serde(flatten)]
    pub room: NormalizedRoom,
    pub diff_per_night: Option<f64>,
    pub pct: Option<f64>,
    pub diff_total: Option<f64>,
}

/// The outcome of one reservation's check. Overwrites the previous result
/// for the same reservation; no history is kept.
#[derive(Debug, Clone, Serialize)]
pub struct CheckResult {
    pub name: String,
    pub property_code: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub num_nights: i64,
    pub adults: u32,
    pub stay_type: StayType,
    pub cancellation_type: CancellationType,
    pub cancel_label: &'static str,
    pub currency: String,
    pub original_rate_per_night: Option<f64>,
    pub original_points_per_night: Option<i64>,
    pub checked_at: DateTime<Utc>,
    /// Best eligible room, or `None` when nothing matched the filters.
    /// No match is an ordinary outcome, distinct from `had_error`.
    pub best: Option<NormalizedRoom>,
    pub savings: Option<Savings>,
    pub other_bests: Vec<AltBest>,
    pub rate_rows: Vec<RateRow>,
    pub had_error: bool,
    pub error: Option<String>,
}

impl CheckResult {
    /// Skeleton result carrying the reservation's descriptors and no rooms.
    pub fn empty(reservation: &Reservation, checked_at: DateTime<Utc>) -> Self {
        CheckResult {
            name: reservation.display_name(),
            property_code: reservation.property_code.to_uppercase(),
            check_in: reservation.check_in,
            check_out: reservation.check_out,
            num_nights: reservation.num_nights(),
            adults: reservation.adults,
            stay_type: reservation.stay_type,
            cancellation_type: reservation.cancellation_type,
            cancel_label: reservation.cancellation_type.label(),
            currency: reservation.currency.clone(),
            original_rate_per_night: reservation.original_rate_per_night,
            original_points_per_night: reservation.original_points_per_night,
            checked_at,
            best: None,
            savings: None,
            other_bests: Vec::new(),
            rate_rows: Vec::new(),
            had_error: false,
            error: None,
        }
    }

    /// Result for a failed fetch/parse. The error is recorded verbatim and
    /// never aborts the rest of the cycle.
    pub fn from_error(
        reservation: &Reservation,
        message: String,
        checked_at: DateTime<Utc>,
    ) -> Self {
        let mut result = CheckResult::empty(reservation, checked_at);
        result.had_error = true;
        result.error = Some(message);
        result
    }

    /// A positive per-night saving was found for this reservation.
    pub fn has_improvement(&self) -> bool {
        self.savings
            .as_ref()
            .map_or(false, |s| s.diff_per_night > 0.0)
    }

    /// Value of the best matched room in the reservation's pricing mode.
    pub fn best_value(&self) -> Option<f64> {
        self.best.as_ref().and_then(|b| b.value_for(self.stay_type))
    }
}

/// Whether the scheduler is between cycles or mid-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Idle,
    Checking,
}

/// Point-in-time view of the schedule state plus the latest result per
/// reservation, served to the status route.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub status: RunStatus,
    pub last_run: Option<DateTime<Utc>>,
    pub next_check: Option<DateTime<Utc>>,
    pub schedule_hours: f64,
    pub results: Vec<CheckResult>,
}
