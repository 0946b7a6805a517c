//! Test Data Builders
//!
//! Provides a builder for measurement records with sensible defaults, so
//! tests only spell out the fields they care about.

use fake::Fake;

use domain_measurement::{BodyMeasurement, BodyPart};

use crate::fixtures::MeasurementFixtures;

/// Builder for constructing test measurement records
pub struct BodyMeasurementBuilder {
    measurement: BodyMeasurement,
}

impl Default for BodyMeasurementBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BodyMeasurementBuilder {
    /// Creates a builder for the fixture user on the fixture date, nothing measured
    pub fn new() -> Self {
        Self {
            measurement: BodyMeasurement::new(
                MeasurementFixtures::user_id(),
                MeasurementFixtures::date(),
            ),
        }
    }

    /// Sets the record id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.measurement.id = id.into();
        self
    }

    /// Sets the owning user
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.measurement.client_id = client_id.into();
        self
    }

    /// Sets the calendar date
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.measurement.date = date.into();
        self
    }

    /// Sets one body part
    pub fn with_part(mut self, part: BodyPart, value: f64) -> Self {
        self.measurement.set_part(part, Some(value));
        self
    }

    /// Sets the creation timestamp
    pub fn with_created_at(mut self, created_at: impl Into<String>) -> Self {
        self.measurement.created_at = Some(created_at.into());
        self
    }

    /// Fills every body part with a plausible random circumference in cm
    pub fn with_random_parts(mut self) -> Self {
        for part in BodyPart::ALL {
            let value: f64 = (20.0f64..130.0f64).fake();
            self.measurement.set_part(part, Some((value * 10.0).round() / 10.0));
        }
        self
    }

    /// Builds the measurement
    pub fn build(self) -> BodyMeasurement {
        self.measurement
    }
}
