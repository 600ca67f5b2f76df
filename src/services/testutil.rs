// src/services/testutil.rs
//! Room and reservation builders shared by the unit tests.

use chrono::NaiveDate;
use serde_json::json;

use crate::models::{CancellationType, NormalizedRoom, Reservation, StayType};
use crate::services::rates::{NightlyRate, PointsPerUnit, RateAmount, RateMode, RawRateRecord};

pub fn cash_room(rate_name: &str, room_type_code: &str, price: f64) -> NormalizedRoom {
    NormalizedRoom {
        rate_name: rate_name.to_string(),
        room_type_code: room_type_code.to_string(),
        room_type_name: "Guest Room".to_string(),
        room_description: String::new(),
        rate_plan_code: String::new(),
        market_code: String::new(),
        price_per_night: Some(price),
        points_per_night: None,
        currency: "CAD".to_string(),
        is_members_only: false,
        deposit_required: false,
        free_cancellation_until: None,
        is_refundable: None,
    }
}

pub fn award_room(room_type_code: &str, points: i64) -> NormalizedRoom {
    NormalizedRoom {
        rate_name: "Redemption".to_string(),
        room_type_code: room_type_code.to_string(),
        room_type_name: "Guest Room".to_string(),
        room_description: String::new(),
        rate_plan_code: String::new(),
        market_code: String::new(),
        price_per_night: None,
        points_per_night: Some(points),
        currency: String::new(),
        is_members_only: false,
        deposit_required: false,
        free_cancellation_until: None,
        is_refundable: Some(true),
    }
}

pub fn raw_record(rate_name: &str, room_type_code: &str, mode: RateMode) -> RawRateRecord {
    RawRateRecord {
        rate_name: rate_name.to_string(),
        room_type_code: room_type_code.to_string(),
        room_type_name: "Guest Room".to_string(),
        room_description: String::new(),
        rate_plan_code: String::new(),
        market_code: String::new(),
        mode,
        is_members_only: false,
        deposit_required: false,
        free_cancellation_until: None,
    }
}

pub fn cash_mode(minor_units: i64, currency: &str) -> RateMode {
    RateMode::Cash {
        average_nightly_rate_per_unit: Some(NightlyRate {
            amount: Some(RateAmount {
                amount: Some(json!(minor_units)),
                currency: Some(currency.to_string()),
                decimal_point: Some(2),
            }),
        }),
    }
}

pub fn points_mode(points: i64) -> RateMode {
    RateMode::Points {
        points_per_unit: Some(PointsPerUnit {
            points: Some(points),
        }),
    }
}

pub fn cash_reservation(property_code: &str, rate_per_night: f64) -> Reservation {
    Reservation {
        name: String::new(),
        property_code: property_code.to_string(),
        check_in: NaiveDate::from_ymd_opt(2026, 9, 10).unwrap(),
        check_out: NaiveDate::from_ymd_opt(2026, 9, 13).unwrap(),
        adults: 2,
        num_rooms: 1,
        stay_type: StayType::Cash,
        original_rate_per_night: Some(rate_per_night),
        original_points_per_night: None,
        currency: "CAD".to_string(),
        cancellation_type: CancellationType::Any,
        room_type: None,
    }
}

pub fn award_reservation(property_code: &str, points_per_night: i64) -> Reservation {
    Reservation {
        stay_type: StayType::Award,
        original_rate_per_night: None,
        original_points_per_night: Some(points_per_night),
        ..cash_reservation(property_code, 0.0)
    }
}
