// src/services/compare.rs
use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{
    AltBest, CancellationType, CheckResult, NormalizedRoom, RateRow, Reservation, Savings,
};
use crate::services::matcher;

/// Savings of a candidate value against the booked reference, per night and
/// for the whole stay. `None` when there is no reference to compare against;
/// the percentage alone is withheld for a zero reference.
pub fn compute_savings(reference: Option<f64>, candidate: f64, num_nights: i64) -> Option<Savings> {
    let reference = reference?;
    let diff_per_night = reference - candidate;
    let pct = if reference != 0.0 {
        Some(diff_per_night / reference * 100.0)
    } else {
        None
    };
    Some(Savings {
        diff_per_night,
        pct,
        diff_total: diff_per_night * num_nights as f64,
    })
}

// Cancellation categories to cross-check beyond the reservation's own, with
// the labels the notifier and status view show.
fn other_categories(own: CancellationType) -> Vec<(CancellationType, &'static str)> {
    match own {
        CancellationType::Refundable => vec![(CancellationType::Nonrefundable, "Non-refundable")],
        CancellationType::Nonrefundable => vec![(CancellationType::Refundable, "Refundable")],
        CancellationType::Any => vec![
            (CancellationType::Refundable, "Refundable"),
            (CancellationType::Nonrefundable, "Non-refundable"),
        ],
    }
}

/// Assemble one reservation's result from its deduplicated rooms: the best
/// match with its savings, the best rate in each other cancellation
/// category, and the annotated rate table.
///
/// "No match" leaves `best` and `savings` empty, deliberately distinct from
/// a matched rate with zero savings.
pub fn build_check_result(
    reservation: &Reservation,
    rooms: &[NormalizedRoom],
    checked_at: DateTime<Utc>,
) -> CheckResult {
    let mut result = CheckResult::empty(reservation, checked_at);
    let reference = reservation.reference_value();
    let num_nights = reservation.num_nights();

    if let Some(best) = matcher::find_best_match(rooms, reservation) {
        let value = best
            .value_for(reservation.stay_type)
            .unwrap_or_default();
        result.savings = compute_savings(reference, value, num_nights);
        result.best = Some(best.clone());
    }

    for (category, label) in other_categories(reservation.cancellation_type) {
        let Some(alt) = matcher::find_best_for_cancellation(rooms, reservation, category) else {
            continue;
        };
        let value = alt.value_for(reservation.stay_type).unwrap_or_default();
        result.other_bests.push(AltBest {
            label,
            cancellation_type: category,
            rate_name: alt.rate_name.clone(),
            room_type_name: alt.room_type_name.clone(),
            value,
            savings: compute_savings(reference, value, num_nights),
        });
    }

    result.rate_rows = annotate_rows(reservation, rooms);
    result
}

// Sorted rate table: rooms priced in the reservation's mode first, cheapest
// to dearest, then the other mode's rooms by their own value. Rows in the
// reservation's mode carry savings against the reference.
fn annotate_rows(reservation: &Reservation, rooms: &[NormalizedRoom]) -> Vec<RateRow> {
    let reference = reservation.reference_value();
    let num_nights = reservation.num_nights();

    let mut sorted: Vec<&NormalizedRoom> = rooms.iter().collect();
    sorted.sort_by(|a, b| row_sort_key(a, reservation)
        .partial_cmp(&row_sort_key(b, reservation))
        .unwrap_or(Ordering::Equal));

    sorted
        .into_iter()
        .map(|room| {
            let savings = room
                .value_for(reservation.stay_type)
                .and_then(|value| compute_savings(reference, value, num_nights));
            RateRow {
                room: room.clone(),
                diff_per_night: savings.as_ref().map(|s| s.diff_per_night),
                pct: savings.as_ref().and_then(|s| s.pct),
                diff_total: savings.as_ref().map(|s| s.diff_total),
            }
        })
        .collect()
}

fn row_sort_key(room: &NormalizedRoom, reservation: &Reservation) -> (u8, f64) {
    match room.value_for(reservation.stay_type) {
        Some(value) => (0, value),
        None => (1, room.own_value().unwrap_or(f64::MAX)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testutil::{award_reservation, award_room, cash_reservation, cash_room};

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn three_night_cash_savings() {
        // Booked 300.00/night, found 250.00/night, 3 nights.
        let reservation = cash_reservation("YKAFI", 300.0);
        let rooms = vec![cash_room("Member Rate", "GNRK", 250.0)];
        let result = build_check_result(&reservation, &rooms, now());

        let savings = result.savings.unwrap();
        assert_eq!(savings.diff_per_night, 50.0);
        assert_eq!(savings.diff_total, 150.0);
        let pct = savings.pct.unwrap();
        assert!((pct - 16.666_666).abs() < 0.001, "pct was {}", pct);
    }

    #[test]
    fn three_night_award_savings() {
        // Booked 50,000 pts/night, found 44,000 pts/night, 3 nights.
        let reservation = award_reservation("YKAFI", 50_000);
        let rooms = vec![award_room("GNRK", 44_000)];
        let result = build_check_result(&reservation, &rooms, now());

        let savings = result.savings.unwrap();
        assert_eq!(savings.diff_per_night, 6_000.0);
        assert_eq!(savings.diff_total, 18_000.0);
        assert_eq!(savings.pct, Some(12.0));
    }

    #[test]
    fn worse_rate_reports_negative_savings() {
        let reservation = cash_reservation("YKAFI", 200.0);
        let rooms = vec![cash_room("Rack Rate", "GNRK", 260.0)];
        let result = build_check_result(&reservation, &rooms, now());

        let savings = result.savings.as_ref().unwrap();
        assert_eq!(savings.diff_per_night, -60.0);
        assert_eq!(savings.diff_total, -180.0);
        assert!(!result.has_improvement());
    }

    #[test]
    fn zero_reference_withholds_percentage() {
        assert_eq!(
            compute_savings(Some(0.0), 100.0, 3),
            Some(Savings {
                diff_per_night: -100.0,
                pct: None,
                diff_total: -300.0,
            })
        );
        assert_eq!(compute_savings(None, 100.0, 3), None);
    }

    #[test]
    fn no_match_is_not_zero_savings() {
        let reservation = cash_reservation("YKAFI", 300.0);
        let result = build_check_result(&reservation, &[], now());
        assert!(result.best.is_none());
        assert!(result.savings.is_none());
        assert!(!result.had_error);

        // A matched rate that ties the reference is a different outcome.
        let rooms = vec![cash_room("Same Rate", "GNRK", 300.0)];
        let tied = build_check_result(&reservation, &rooms, now());
        assert!(tied.best.is_some());
        assert_eq!(tied.savings.unwrap().diff_per_night, 0.0);
    }

    #[test]
    fn other_category_bests_are_reported() {
        let mut flexible = cash_room("Flexible Rate", "GNRK", 259.0);
        flexible.is_refundable = Some(true);
        let mut prepay = cash_room("Prepay", "GNRK", 199.0);
        prepay.is_refundable = Some(false);

        let mut reservation = cash_reservation("YKAFI", 250.0);
        reservation.cancellation_type = CancellationType::Refundable;

        let result = build_check_result(&reservation, &[flexible, prepay], now());
        assert_eq!(result.best.as_ref().unwrap().price_per_night, Some(259.0));
        assert_eq!(result.other_bests.len(), 1);

        let alt = &result.other_bests[0];
        assert_eq!(alt.label, "Non-refundable");
        assert_eq!(alt.value, 199.0);
        assert_eq!(alt.savings.as_ref().unwrap().diff_per_night, 51.0);
    }

    #[test]
    fn rate_rows_sorted_with_own_mode_first() {
        let reservation = cash_reservation("YKAFI", 250.0);
        let rooms = vec![
            award_room("GNRK", 144_000),
            cash_room("Rack Rate", "GNRK", 289.0),
            cash_room("Member Rate", "GNRK", 219.0),
        ];
        let result = build_check_result(&reservation, &rooms, now());

        let prices: Vec<Option<f64>> = result
            .rate_rows
            .iter()
            .map(|row| row.room.price_per_night)
            .collect();
        assert_eq!(prices, vec![Some(219.0), Some(289.0), None]);

        // Cash rows carry savings, the award row does not.
        assert_eq!(result.rate_rows[0].diff_per_night, Some(31.0));
        assert!(result.rate_rows[2].diff_per_night.is_none());
    }
}
