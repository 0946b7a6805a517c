//! Custom Test Assertions
//!
//! Provides assertion helpers for measurement records that give more
//! meaningful failure messages than standard assertions.

use domain_measurement::{BodyMeasurement, BodyPart};

/// Asserts that a history is ordered by date, newest first
///
/// # Panics
///
/// Panics at the first adjacent pair that is out of order
pub fn assert_newest_first(history: &[BodyMeasurement]) {
    for pair in history.windows(2) {
        assert!(
            pair[0].date >= pair[1].date,
            "History out of order: {} ({}) listed before {} ({})",
            pair[0].date,
            pair[0].id,
            pair[1].date,
            pair[1].id
        );
    }
}

/// Asserts that two records carry the same body-part values
///
/// Identity and timestamps are ignored.
pub fn assert_same_parts(actual: &BodyMeasurement, expected: &BodyMeasurement) {
    for part in BodyPart::ALL {
        assert_eq!(
            actual.part(part),
            expected.part(part),
            "Body part {} differs: actual={:?}, expected={:?}",
            part,
            actual.part(part),
            expected.part(part)
        );
    }
}

/// Asserts that every record in the history belongs to the user
pub fn assert_owned_by(history: &[BodyMeasurement], client_id: &str) {
    for m in history {
        assert_eq!(
            m.client_id, client_id,
            "Record {} on {} belongs to {}, expected {}",
            m.id, m.date, m.client_id, client_id
        );
    }
}
