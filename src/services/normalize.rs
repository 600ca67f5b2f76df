// src/services/normalize.rs
use std::collections::HashMap;

use log::debug;
use serde_json::Value;

use crate::models::NormalizedRoom;
use crate::services::rates::{RateAmount, RateMode, RawRateRecord};

/// Scale a wire amount into a decimal price. Amounts arrive in minor units
/// (`22900` with `decimalPoint: 2` is 229.00); the decimal point defaults to
/// 2 when omitted. Returns `None` for anything unusable.
pub fn parse_price(amount: &RateAmount) -> Option<f64> {
    let raw = match amount.amount.as_ref()? {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let scale = 10f64.powi(amount.decimal_point.unwrap_or(2) as i32);
    Some(raw / scale)
}

const NONREFUNDABLE_KEYWORDS: [&str; 5] = [
    "prepay",
    "advance purchase",
    "non-refund",
    "non refund",
    "nonrefund",
];
const REFUNDABLE_KEYWORDS: [&str; 3] = ["flexible", "flex", "refundable"];

// Availability searches often come back without freeCancellationUntil even
// for flexible rates, so the flag has to be inferred from the attributes the
// response does carry. Order matters: explicit signals beat name keywords.
fn infer_refundability(
    is_award: bool,
    free_cancellation_until: Option<&str>,
    deposit_required: bool,
    rate_name: &str,
) -> Option<bool> {
    if is_award {
        return Some(true);
    }
    if free_cancellation_until.is_some() {
        return Some(true);
    }
    if deposit_required {
        return Some(false);
    }
    let lower = rate_name.to_lowercase();
    if NONREFUNDABLE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Some(false);
    }
    if REFUNDABLE_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Some(true);
    }
    None
}

/// Map one raw record into the canonical shape, or drop it.
///
/// Dispatch is on the pricing-mode tag: cash records need a parseable
/// amount, points records need a point count, and unknown modes are dropped
/// without complaint, since the upstream schema grows new modes from time to
/// time. A record that survives the branch but has no value is dropped too.
pub fn normalize_record(record: RawRateRecord) -> Option<NormalizedRoom> {
    let (price_per_night, points_per_night, currency) = match &record.mode {
        RateMode::Cash {
            average_nightly_rate_per_unit,
        } => {
            let amount = average_nightly_rate_per_unit.as_ref()?.amount.as_ref()?;
            let price = match parse_price(amount) {
                Some(price) => price,
                None => {
                    debug!("Dropping cash record '{}': unparseable amount", record.rate_name);
                    return None;
                }
            };
            (
                Some(price),
                None,
                amount.currency.clone().unwrap_or_default(),
            )
        }
        RateMode::Points { points_per_unit } => {
            let points = points_per_unit.as_ref()?.points?;
            (None, Some(points), String::new())
        }
        RateMode::Unknown => {
            debug!("Dropping record '{}': unsupported rate mode", record.rate_name);
            return None;
        }
    };

    let is_refundable = infer_refundability(
        points_per_night.is_some(),
        record.free_cancellation_until.as_deref(),
        record.deposit_required,
        &record.rate_name,
    );

    Some(NormalizedRoom {
        rate_name: record.rate_name,
        room_type_code: record.room_type_code,
        room_type_name: record.room_type_name,
        room_description: record.room_description,
        rate_plan_code: record.rate_plan_code,
        market_code: record.market_code,
        price_per_night,
        points_per_night,
        currency,
        is_members_only: record.is_members_only,
        deposit_required: record.deposit_required,
        free_cancellation_until: record.free_cancellation_until,
        is_refundable,
    })
}

/// Normalize a whole fetch, silently dropping incomplete records.
pub fn normalize_records(records: Vec<RawRateRecord>) -> Vec<NormalizedRoom> {
    records.into_iter().filter_map(normalize_record).collect()
}

/// Collapse rooms sharing `(rate_name, room_type_code)` down to the cheapest
/// variant per pair: cheapest price for cash rooms, fewest points for award
/// rooms. A tie (or a pair that somehow mixes pricing modes) keeps the first
/// room encountered, so the output is deterministic for a given input order.
pub fn dedupe_rooms(rooms: Vec<NormalizedRoom>) -> Vec<NormalizedRoom> {
    let mut kept: Vec<NormalizedRoom> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for room in rooms {
        let key = (room.rate_name.clone(), room.room_type_code.clone());
        match index.get(&key) {
            Some(&i) => {
                if beats(&room, &kept[i]) {
                    kept[i] = room;
                }
            }
            None => {
                index.insert(key, kept.len());
                kept.push(room);
            }
        }
    }
    kept
}

// Strictly lower value in the same pricing mode wins; everything else keeps
// the incumbent.
fn beats(challenger: &NormalizedRoom, incumbent: &NormalizedRoom) -> bool {
    match (
        challenger.price_per_night,
        incumbent.price_per_night,
        challenger.points_per_night,
        incumbent.points_per_night,
    ) {
        (Some(new), Some(old), _, _) => new < old,
        (_, _, Some(new), Some(old)) => new < old,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    use crate::services::testutil::{award_room, cash_mode, cash_room, points_mode, raw_record as raw};

    #[test]
    fn cash_record_scales_minor_units() {
        let room = normalize_record(raw("Flexible Rate", "GNRK", cash_mode(22900, "CAD"))).unwrap();
        assert_eq!(room.price_per_night, Some(229.0));
        assert_eq!(room.points_per_night, None);
        assert_eq!(room.currency, "CAD");
    }

    #[test]
    fn string_amounts_parse_too() {
        let mode = RateMode::Cash {
            average_nightly_rate_per_unit: Some(crate::services::rates::NightlyRate {
                amount: Some(RateAmount {
                    amount: Some(json!("18950")),
                    currency: Some("USD".to_string()),
                    decimal_point: None,
                }),
            }),
        };
        let room = normalize_record(raw("Prepay", "GNRK", mode)).unwrap();
        assert_eq!(room.price_per_night, Some(189.50));
    }

    #[test]
    fn points_record_keeps_integer_points() {
        let room = normalize_record(raw("Redemption", "GNRK", points_mode(144_000))).unwrap();
        assert_eq!(room.points_per_night, Some(144_000));
        assert_eq!(room.price_per_night, None);
        assert_eq!(room.rate_name, "Redemption");
    }

    #[test]
    fn exactly_one_value_is_set() {
        let cash = normalize_record(raw("Flexible Rate", "GNRK", cash_mode(22900, "CAD"))).unwrap();
        assert!(cash.price_per_night.is_some() && cash.points_per_night.is_none());
        let award = normalize_record(raw("Redemption", "GNRK", points_mode(50_000))).unwrap();
        assert!(award.points_per_night.is_some() && award.price_per_night.is_none());
    }

    #[test]
    fn missing_amount_discards_record() {
        let mode = RateMode::Cash {
            average_nightly_rate_per_unit: Some(crate::services::rates::NightlyRate {
                amount: None,
            }),
        };
        assert!(normalize_record(raw("Flexible Rate", "GNRK", mode)).is_none());
    }

    #[test]
    fn unparseable_amount_discards_record() {
        let mode = RateMode::Cash {
            average_nightly_rate_per_unit: Some(crate::services::rates::NightlyRate {
                amount: Some(RateAmount {
                    amount: Some(json!({"nested": true})),
                    currency: None,
                    decimal_point: None,
                }),
            }),
        };
        assert!(normalize_record(raw("Flexible Rate", "GNRK", mode)).is_none());
    }

    #[test]
    fn unknown_mode_discards_record() {
        assert!(normalize_record(raw("Mystery", "GNRK", RateMode::Unknown)).is_none());
    }

    #[test]
    fn missing_points_discards_record() {
        let mode = RateMode::Points {
            points_per_unit: Some(crate::services::rates::PointsPerUnit { points: None }),
        };
        assert!(normalize_record(raw("Redemption", "GNRK", mode)).is_none());
    }

    #[test]
    fn award_rooms_are_refundable() {
        let room = normalize_record(raw("Redemption", "GNRK", points_mode(50_000))).unwrap();
        assert_eq!(room.is_refundable, Some(true));
    }

    #[test]
    fn free_cancellation_deadline_means_refundable() {
        let mut record = raw("Some Rate", "GNRK", cash_mode(20000, "CAD"));
        record.free_cancellation_until = Some("2026-09-08T23:59".to_string());
        let room = normalize_record(record).unwrap();
        assert_eq!(room.is_refundable, Some(true));
        assert_eq!(
            room.free_cancellation_until.as_deref(),
            Some("2026-09-08T23:59")
        );
    }

    #[test]
    fn deposit_required_means_nonrefundable() {
        let mut record = raw("Some Rate", "GNRK", cash_mode(20000, "CAD"));
        record.deposit_required = true;
        assert_eq!(normalize_record(record).unwrap().is_refundable, Some(false));
    }

    #[test]
    fn rate_name_keywords_drive_inference() {
        let prepay = normalize_record(raw("Advance Purchase", "GNRK", cash_mode(20000, "CAD")));
        assert_eq!(prepay.unwrap().is_refundable, Some(false));

        let flex = normalize_record(raw("Flexible Rate", "GNRK", cash_mode(20000, "CAD")));
        assert_eq!(flex.unwrap().is_refundable, Some(true));

        let opaque = normalize_record(raw("Package Deal", "GNRK", cash_mode(20000, "CAD")));
        assert_eq!(opaque.unwrap().is_refundable, None);
    }

    #[test]
    fn dedupe_keeps_cheapest_per_pair() {
        let rooms = vec![
            cash_room("Flexible Rate", "GNRK", 249.0),
            cash_room("Flexible Rate", "GNRK", 229.0),
            cash_room("Flexible Rate", "SUIT", 399.0),
            award_room("GNRK", 150_000),
            award_room("GNRK", 144_000),
        ];
        let deduped = dedupe_rooms(rooms);
        assert_eq!(deduped.len(), 3);
        assert_eq!(deduped[0].price_per_night, Some(229.0));
        assert_eq!(deduped[1].price_per_night, Some(399.0));
        assert_eq!(deduped[2].points_per_night, Some(144_000));
    }

    #[test]
    fn dedupe_output_is_unique_per_pair_with_minimal_value() {
        let rooms = vec![
            cash_room("A", "R1", 300.0),
            cash_room("A", "R1", 250.0),
            cash_room("A", "R1", 275.0),
            cash_room("B", "R1", 100.0),
            cash_room("A", "R2", 50.0),
        ];
        let deduped = dedupe_rooms(rooms.clone());

        let mut seen = std::collections::HashSet::new();
        for room in &deduped {
            let key = (room.rate_name.clone(), room.room_type_code.clone());
            assert!(seen.insert(key.clone()), "duplicate pair {:?}", key);
            let group_min = rooms
                .iter()
                .filter(|r| r.rate_name == room.rate_name && r.room_type_code == room.room_type_code)
                .filter_map(|r| r.price_per_night)
                .fold(f64::INFINITY, f64::min);
            assert_eq!(room.price_per_night, Some(group_min));
        }
    }

    #[test]
    fn dedupe_tie_keeps_first_encountered() {
        let mut first = cash_room("A", "R1", 200.0);
        first.rate_plan_code = "FIRST".to_string();
        let mut second = cash_room("A", "R1", 200.0);
        second.rate_plan_code = "SECOND".to_string();

        let deduped = dedupe_rooms(vec![first, second]);
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].rate_plan_code, "FIRST");
    }
}
