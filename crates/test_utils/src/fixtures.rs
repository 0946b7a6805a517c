//! Pre-built Test Fixtures
//!
//! Provides ready-to-use measurement data. These fixtures are consistent and
//! predictable so assertions can name exact values.

use chrono::{Duration, NaiveDate};
use serde_json::{json, Value};

use core_kernel::Row;
use domain_measurement::{BodyMeasurement, BodyPart};

use crate::builders::BodyMeasurementBuilder;

/// Fixture for measurement test data
pub struct MeasurementFixtures;

impl MeasurementFixtures {
    /// The default user
    pub fn user_id() -> &'static str {
        "u1"
    }

    /// A second user whose records must never leak into the first's history
    pub fn other_user_id() -> &'static str {
        "u2"
    }

    /// The default measurement date
    pub fn date() -> &'static str {
        "2024-01-01"
    }

    /// A first-of-the-year measurement with a handful of parts
    pub fn new_year() -> BodyMeasurement {
        BodyMeasurementBuilder::new()
            .with_part(BodyPart::Neck, 38.0)
            .with_part(BodyPart::Chest, 102.5)
            .with_part(BodyPart::Waist, 84.0)
            .with_part(BodyPart::Hips, 98.0)
            .build()
    }

    /// The same day as `new_year`, measured again with different values
    pub fn new_year_remeasured() -> BodyMeasurement {
        BodyMeasurementBuilder::new()
            .with_part(BodyPart::Neck, 37.5)
            .with_part(BodyPart::Waist, 83.0)
            .with_part(BodyPart::Calves, 39.0)
            .build()
    }

    /// One record per day for `days` consecutive days starting at `start`
    ///
    /// Returned in chronological order; waist shrinks by half a centimetre a day.
    pub fn daily_series(client_id: &str, start: NaiveDate, days: u32) -> Vec<BodyMeasurement> {
        (0..days)
            .map(|offset| {
                let date = start + Duration::days(i64::from(offset));
                BodyMeasurementBuilder::new()
                    .with_client_id(client_id)
                    .with_date(date.format("%Y-%m-%d").to_string())
                    .with_part(BodyPart::Waist, 90.0 - f64::from(offset) * 0.5)
                    .build()
            })
            .collect()
    }
}

/// Fixture for raw backend rows
pub struct RowFixtures;

impl RowFixtures {
    /// A stored `body_measurements` row with server columns set
    pub fn measurement_row(id: &str, client_id: &str, date: &str, created_at: &str) -> Row {
        Self::object(json!({
            "id": id,
            "client_id": client_id,
            "date": date,
            "neck": null,
            "shoulders": null,
            "chest": 101.0,
            "arms": null,
            "forearms": null,
            "waist": 82.5,
            "hips": null,
            "glutes": null,
            "legs": null,
            "calves": null,
            "created_at": created_at
        }))
    }

    /// A row the backend returned without an `id` column
    pub fn row_without_id(client_id: &str, date: &str) -> Row {
        Self::object(json!({
            "client_id": client_id,
            "date": date,
            "waist": 80.0
        }))
    }

    /// Unwraps a JSON object literal into a row
    pub fn object(value: Value) -> Row {
        match value {
            Value::Object(row) => row,
            other => panic!("row fixture must be a JSON object, got {}", other),
        }
    }
}
