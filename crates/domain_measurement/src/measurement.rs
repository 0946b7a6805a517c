//! Body measurement records
//!
//! A `BodyMeasurement` holds the circumference of each measured body part on a
//! given day. Every part is optional; `None` means the part was not measured.

use serde::{Deserialize, Serialize};
use std::fmt;

use core_kernel::generate_record_id;

/// A measurable body part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Neck,
    Shoulders,
    Chest,
    Arms,
    Forearms,
    Waist,
    Hips,
    Glutes,
    Legs,
    Calves,
}

impl BodyPart {
    /// Every body part, head to toe
    pub const ALL: [BodyPart; 10] = [
        BodyPart::Neck,
        BodyPart::Shoulders,
        BodyPart::Chest,
        BodyPart::Arms,
        BodyPart::Forearms,
        BodyPart::Waist,
        BodyPart::Hips,
        BodyPart::Glutes,
        BodyPart::Legs,
        BodyPart::Calves,
    ];

    /// Returns the backend column holding this part
    pub fn column(&self) -> &'static str {
        match self {
            BodyPart::Neck => "neck",
            BodyPart::Shoulders => "shoulders",
            BodyPart::Chest => "chest",
            BodyPart::Arms => "arms",
            BodyPart::Forearms => "forearms",
            BodyPart::Waist => "waist",
            BodyPart::Hips => "hips",
            BodyPart::Glutes => "glutes",
            BodyPart::Legs => "legs",
            BodyPart::Calves => "calves",
        }
    }
}

impl fmt::Display for BodyPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// A user's body measurements for one calendar day
///
/// `(client_id, date)` identifies the day's record for a user. The store keeps
/// it unique by updating in place when a record for that day already exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMeasurement {
    /// Record identifier, server-assigned once persisted
    pub id: String,
    /// Owning user
    pub client_id: String,
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    pub neck: Option<f64>,
    pub shoulders: Option<f64>,
    pub chest: Option<f64>,
    pub arms: Option<f64>,
    pub forearms: Option<f64>,
    pub waist: Option<f64>,
    pub hips: Option<f64>,
    pub glutes: Option<f64>,
    pub legs: Option<f64>,
    pub calves: Option<f64>,
    /// Set by the backend on insert
    pub created_at: Option<String>,
}

impl BodyMeasurement {
    /// Creates an empty record for a user and day with a locally generated id
    pub fn new(client_id: impl Into<String>, date: impl Into<String>) -> Self {
        Self {
            id: generate_record_id(),
            client_id: client_id.into(),
            date: date.into(),
            neck: None,
            shoulders: None,
            chest: None,
            arms: None,
            forearms: None,
            waist: None,
            hips: None,
            glutes: None,
            legs: None,
            calves: None,
            created_at: None,
        }
    }

    /// Returns the measurement for a body part
    pub fn part(&self, part: BodyPart) -> Option<f64> {
        match part {
            BodyPart::Neck => self.neck,
            BodyPart::Shoulders => self.shoulders,
            BodyPart::Chest => self.chest,
            BodyPart::Arms => self.arms,
            BodyPart::Forearms => self.forearms,
            BodyPart::Waist => self.waist,
            BodyPart::Hips => self.hips,
            BodyPart::Glutes => self.glutes,
            BodyPart::Legs => self.legs,
            BodyPart::Calves => self.calves,
        }
    }

    /// Sets or clears the measurement for a body part
    pub fn set_part(&mut self, part: BodyPart, value: Option<f64>) {
        let slot = match part {
            BodyPart::Neck => &mut self.neck,
            BodyPart::Shoulders => &mut self.shoulders,
            BodyPart::Chest => &mut self.chest,
            BodyPart::Arms => &mut self.arms,
            BodyPart::Forearms => &mut self.forearms,
            BodyPart::Waist => &mut self.waist,
            BodyPart::Hips => &mut self.hips,
            BodyPart::Glutes => &mut self.glutes,
            BodyPart::Legs => &mut self.legs,
            BodyPart::Calves => &mut self.calves,
        };
        *slot = value;
    }

    /// Returns the measured parts with their values, head to toe
    pub fn measured_parts(&self) -> Vec<(BodyPart, f64)> {
        BodyPart::ALL
            .iter()
            .filter_map(|part| self.part(*part).map(|value| (*part, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_record_is_unmeasured() {
        let m = BodyMeasurement::new("u1", "2024-01-01");
        assert_eq!(m.client_id, "u1");
        assert_eq!(m.date, "2024-01-01");
        assert!(!m.id.is_empty());
        assert!(m.created_at.is_none());
        assert!(m.measured_parts().is_empty());
    }

    #[test]
    fn test_set_and_read_every_part() {
        let mut m = BodyMeasurement::new("u1", "2024-01-01");
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            m.set_part(*part, Some(10.0 + i as f64));
        }
        for (i, part) in BodyPart::ALL.iter().enumerate() {
            assert_eq!(m.part(*part), Some(10.0 + i as f64));
        }
        assert_eq!(m.measured_parts().len(), BodyPart::ALL.len());

        m.set_part(BodyPart::Waist, None);
        assert_eq!(m.part(BodyPart::Waist), None);
        assert!(!m.measured_parts().iter().any(|(p, _)| *p == BodyPart::Waist));
    }

    #[test]
    fn test_part_column_names() {
        assert_eq!(BodyPart::Forearms.column(), "forearms");
        assert_eq!(BodyPart::Calves.to_string(), "calves");
    }

    #[test]
    fn test_domain_serialization_is_camel_case() {
        let m = BodyMeasurement::new("u1", "2024-01-01");
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["clientId"], "u1");
        assert!(json.get("client_id").is_none());
    }
}
