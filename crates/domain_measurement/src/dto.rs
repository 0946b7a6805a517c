//! Wire representation of body measurements
//!
//! `BodyMeasurementDto` mirrors the `body_measurements` table column for
//! column. Conversions to and from the domain model are plain field copies,
//! except that a record arriving without an `id` receives a locally
//! generated one.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{generate_record_id, PortError, Row};

use crate::measurement::BodyMeasurement;

/// A `body_measurements` row as sent to and received from the backend
///
/// Body-part columns serialize as `null` when unmeasured so that a full
/// overwrite clears them. `id` and `created_at` are omitted when absent so
/// the backend can assign them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyMeasurementDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub client_id: String,
    pub date: String,
    #[serde(default)]
    pub neck: Option<f64>,
    #[serde(default)]
    pub shoulders: Option<f64>,
    #[serde(default)]
    pub chest: Option<f64>,
    #[serde(default)]
    pub arms: Option<f64>,
    #[serde(default)]
    pub forearms: Option<f64>,
    #[serde(default)]
    pub waist: Option<f64>,
    #[serde(default)]
    pub hips: Option<f64>,
    #[serde(default)]
    pub glutes: Option<f64>,
    #[serde(default)]
    pub legs: Option<f64>,
    #[serde(default)]
    pub calves: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl BodyMeasurementDto {
    /// Returns the payload written on insert, update and upsert
    ///
    /// Server-owned columns are stripped: the backend assigns `id` and
    /// `created_at` on insert and neither changes afterwards.
    pub fn for_write(&self) -> Self {
        Self {
            id: None,
            created_at: None,
            ..self.clone()
        }
    }

    /// Serializes into a backend row
    pub fn to_row(&self) -> Result<Row, PortError> {
        match serde_json::to_value(self)? {
            Value::Object(row) => Ok(row),
            other => Err(PortError::transformation(format!(
                "measurement serialized to {} instead of an object",
                other
            ))),
        }
    }
}

impl TryFrom<Row> for BodyMeasurementDto {
    type Error = PortError;

    fn try_from(row: Row) -> Result<Self, Self::Error> {
        Ok(serde_json::from_value(Value::Object(row))?)
    }
}

impl From<BodyMeasurementDto> for BodyMeasurement {
    fn from(dto: BodyMeasurementDto) -> Self {
        Self {
            id: dto.id.unwrap_or_else(generate_record_id),
            client_id: dto.client_id,
            date: dto.date,
            neck: dto.neck,
            shoulders: dto.shoulders,
            chest: dto.chest,
            arms: dto.arms,
            forearms: dto.forearms,
            waist: dto.waist,
            hips: dto.hips,
            glutes: dto.glutes,
            legs: dto.legs,
            calves: dto.calves,
            created_at: dto.created_at,
        }
    }
}

impl From<&BodyMeasurement> for BodyMeasurementDto {
    fn from(m: &BodyMeasurement) -> Self {
        Self {
            id: Some(m.id.clone()),
            client_id: m.client_id.clone(),
            date: m.date.clone(),
            neck: m.neck,
            shoulders: m.shoulders,
            chest: m.chest,
            arms: m.arms,
            forearms: m.forearms,
            waist: m.waist,
            hips: m.hips,
            glutes: m.glutes,
            legs: m.legs,
            calves: m.calves,
            created_at: m.created_at.clone(),
        }
    }
}
