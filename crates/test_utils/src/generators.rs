//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating random measurement data.

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;

use domain_measurement::{BodyMeasurement, BodyMeasurementDto};

/// Strategy for user identifiers
pub fn client_id_strategy() -> impl Strategy<Value = String> {
    "u[0-9a-f]{1,8}".prop_map(|s| s)
}

/// Strategy for ISO calendar dates between 2000 and roughly 2050
pub fn date_strategy() -> impl Strategy<Value = String> {
    (0i64..18_250).prop_map(|offset| {
        let base = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap_or_default();
        (base + Duration::days(offset)).format("%Y-%m-%d").to_string()
    })
}

/// Strategy for an optional circumference in cm, one decimal place
pub fn part_strategy() -> impl Strategy<Value = Option<f64>> {
    prop::option::of((100u32..1500u32).prop_map(|tenths| f64::from(tenths) / 10.0))
}

/// Strategy for ten optional body-part values, head to toe
pub fn parts_strategy() -> impl Strategy<Value = [Option<f64>; 10]> {
    prop::array::uniform10(part_strategy())
}

/// Strategy for an RFC 3339 creation timestamp
pub fn created_at_strategy() -> impl Strategy<Value = String> {
    (0i64..1_000_000_000).prop_map(|secs| {
        let base = NaiveDate::from_ymd_opt(2020, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default()
            .and_utc();
        (base + Duration::seconds(secs)).to_rfc3339()
    })
}

/// Strategy for wire records; `id` and `created_at` may be absent
pub fn dto_strategy() -> impl Strategy<Value = BodyMeasurementDto> {
    (
        prop::option::of("[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}"),
        client_id_strategy(),
        date_strategy(),
        parts_strategy(),
        prop::option::of(created_at_strategy()),
    )
        .prop_map(|(id, client_id, date, p, created_at)| BodyMeasurementDto {
            id,
            client_id,
            date,
            neck: p[0],
            shoulders: p[1],
            chest: p[2],
            arms: p[3],
            forearms: p[4],
            waist: p[5],
            hips: p[6],
            glutes: p[7],
            legs: p[8],
            calves: p[9],
            created_at,
        })
}

/// Strategy for domain records, always carrying an id
pub fn measurement_strategy() -> impl Strategy<Value = BodyMeasurement> {
    (dto_strategy(), "[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}").prop_map(
        |(mut dto, fallback_id)| {
            dto.id.get_or_insert(fallback_id);
            BodyMeasurement::from(dto)
        },
    )
}
