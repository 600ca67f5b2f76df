// src/services/matcher.rs
use crate::models::{CancellationType, NormalizedRoom, Reservation};

/// Pick the best room for the reservation under its own cancellation filter.
pub fn find_best_match<'a>(
    rooms: &'a [NormalizedRoom],
    reservation: &Reservation,
) -> Option<&'a NormalizedRoom> {
    find_best_for_cancellation(rooms, reservation, reservation.cancellation_type)
}

/// Pick the best room under an explicit cancellation category, used both for
/// the reservation's own match and for the "what would the other category
/// cost" comparison.
///
/// Eligibility: the room must be priced in the reservation's mode (cash
/// rooms for cash stays, award rooms for award stays), must satisfy the
/// room-type restriction when one is set, and must pass the cancellation
/// filter: rooms with unknown refundability only qualify under `Any`.
/// The winner is the lowest value in the relevant field; a tie keeps the
/// first room encountered. An empty field is "no match", not an error.
pub fn find_best_for_cancellation<'a>(
    rooms: &'a [NormalizedRoom],
    reservation: &Reservation,
    cancellation: CancellationType,
) -> Option<&'a NormalizedRoom> {
    let mut best: Option<(&NormalizedRoom, f64)> = None;

    for room in rooms {
        let Some(value) = room.value_for(reservation.stay_type) else {
            continue;
        };
        if let Some(wanted) = reservation.room_type.as_deref() {
            if !room.room_type_code.eq_ignore_ascii_case(wanted) {
                continue;
            }
        }
        let passes = match cancellation {
            CancellationType::Any => true,
            CancellationType::Refundable => room.is_refundable == Some(true),
            CancellationType::Nonrefundable => room.is_refundable == Some(false),
        };
        if !passes {
            continue;
        }
        match best {
            Some((_, best_value)) if value >= best_value => {}
            _ => best = Some((room, value)),
        }
    }

    best.map(|(room, _)| room)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StayType;
    use crate::services::testutil::{award_reservation, award_room, cash_reservation, cash_room};

    #[test]
    fn cash_stay_never_matches_points_rooms() {
        // One property offering the same stay for 229.00 cash or 144,000 pts.
        let rooms = vec![cash_room("Flexible Rate", "GNRK", 229.0), award_room("GNRK", 144_000)];

        let cash = cash_reservation("YKAFI", 250.0);
        let best = find_best_match(&rooms, &cash).unwrap();
        assert!(best.price_per_night.is_some());
        assert_eq!(best.rate_name, "Flexible Rate");

        let award = award_reservation("YKAFI", 150_000);
        let best = find_best_match(&rooms, &award).unwrap();
        assert!(best.points_per_night.is_some());
        assert_eq!(best.rate_name, "Redemption");
    }

    #[test]
    fn picks_lowest_value_in_mode() {
        let rooms = vec![
            cash_room("Rack Rate", "GNRK", 289.0),
            cash_room("Member Rate", "GNRK", 219.0),
            cash_room("AAA Rate", "GNRK", 239.0),
        ];
        let reservation = cash_reservation("YKAFI", 250.0);
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert_eq!(best.price_per_night, Some(219.0));
    }

    #[test]
    fn award_stay_picks_fewest_points() {
        let rooms = vec![award_room("GNRK", 50_000), award_room("SUIT", 44_000)];
        let reservation = award_reservation("YKAFI", 50_000);
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert_eq!(best.points_per_night, Some(44_000));
    }

    #[test]
    fn refundable_filter_admits_only_explicit_true() {
        let mut refundable = cash_room("Flexible Rate", "GNRK", 259.0);
        refundable.is_refundable = Some(true);
        let mut prepay = cash_room("Prepay", "GNRK", 199.0);
        prepay.is_refundable = Some(false);
        let unknown = cash_room("Package", "GNRK", 179.0); // is_refundable: None

        let mut reservation = cash_reservation("YKAFI", 250.0);
        reservation.cancellation_type = CancellationType::Refundable;

        let rooms = vec![prepay.clone(), unknown.clone(), refundable.clone()];
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert_eq!(best.is_refundable, Some(true));
        assert_eq!(best.price_per_night, Some(259.0));

        reservation.cancellation_type = CancellationType::Nonrefundable;
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert_eq!(best.price_per_night, Some(199.0));

        // Unknown refundability only competes under Any.
        reservation.cancellation_type = CancellationType::Any;
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert_eq!(best.price_per_night, Some(179.0));
    }

    #[test]
    fn no_eligible_rooms_is_no_match() {
        let rooms = vec![award_room("GNRK", 144_000)];
        let reservation = cash_reservation("YKAFI", 250.0);
        assert!(find_best_match(&rooms, &reservation).is_none());
        assert!(find_best_match(&[], &reservation).is_none());
    }

    #[test]
    fn cash_match_always_has_a_price() {
        let rooms = vec![
            award_room("GNRK", 144_000),
            cash_room("Flexible Rate", "GNRK", 229.0),
            award_room("SUIT", 90_000),
        ];
        let reservation = cash_reservation("YKAFI", 250.0);
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert!(best.price_per_night.is_some());
        assert_eq!(reservation.stay_type, StayType::Cash);
    }

    #[test]
    fn room_type_restriction_narrows_the_field() {
        let rooms = vec![
            cash_room("Flexible Rate", "GNRK", 199.0),
            cash_room("Flexible Rate", "SUIT", 399.0),
        ];
        let mut reservation = cash_reservation("YKAFI", 450.0);
        reservation.room_type = Some("suit".to_string());
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert_eq!(best.room_type_code, "SUIT");
    }

    #[test]
    fn tie_keeps_first_encountered() {
        let mut first = cash_room("A Rate", "GNRK", 200.0);
        first.rate_plan_code = "FIRST".to_string();
        let mut second = cash_room("B Rate", "GNRK", 200.0);
        second.rate_plan_code = "SECOND".to_string();

        let rooms = vec![first, second];
        let reservation = cash_reservation("YKAFI", 250.0);
        let best = find_best_match(&rooms, &reservation).unwrap();
        assert_eq!(best.rate_plan_code, "FIRST");
    }
}
