use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// The typed measurement carried by a [`Datum`].
///
/// Serialized into the `payload` column with an internal `data_type` tag, so
/// the same tag names the measurement kind on the wire and in storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "data_type", rename_all = "snake_case")]
pub enum DatumValue {
    Temperature { deg_c: f64 },
    HeartRate { bpm: i64 },
    BloodPressure { systolic: i64, diastolic: i64 },
    OxygenSaturation { percentage: f64 },
    GlucoseLevel { mg_dl: f64 },
    Weight { grams: i64 },
}

impl DatumValue {
    /// The storage tag for this measurement kind.
    pub fn data_type(&self) -> &'static str {
        match self {
            Self::Temperature { .. } => "temperature",
            Self::HeartRate { .. } => "heart_rate",
            Self::BloodPressure { .. } => "blood_pressure",
            Self::OxygenSaturation { .. } => "oxygen_saturation",
            Self::GlucoseLevel { .. } => "glucose_level",
            Self::Weight { .. } => "weight",
        }
    }
}

/// One measurement reported by a device for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    pub datum_id: Option<i64>,
    pub device_id: i64,
    pub assigned_user: i64,
    /// When the device took the measurement.
    pub collection_time: NaiveDateTime,
    /// When the backend received it.
    pub received_time: NaiveDateTime,
    pub value: DatumValue,
}

impl Datum {
    pub fn new(
        device_id: i64,
        assigned_user: i64,
        collection_time: NaiveDateTime,
        received_time: NaiveDateTime,
        value: DatumValue,
    ) -> Self {
        Self {
            datum_id: None,
            device_id,
            assigned_user,
            collection_time,
            received_time,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_tags_match_data_type() {
        let values = [
            (DatumValue::Temperature { deg_c: 37.2 }, "temperature"),
            (DatumValue::HeartRate { bpm: 75 }, "heart_rate"),
            (
                DatumValue::BloodPressure {
                    systolic: 120,
                    diastolic: 80,
                },
                "blood_pressure",
            ),
            (
                DatumValue::OxygenSaturation { percentage: 98.3 },
                "oxygen_saturation",
            ),
            (DatumValue::GlucoseLevel { mg_dl: 92.0 }, "glucose_level"),
            (DatumValue::Weight { grams: 65_039 }, "weight"),
        ];

        for (value, tag) in values {
            assert_eq!(value.data_type(), tag);
            let json = serde_json::to_string(&value).unwrap();
            assert!(json.contains(&format!("\"data_type\":\"{tag}\"")));
            let back: DatumValue = serde_json::from_str(&json).unwrap();
            assert_eq!(back, value);
        }
    }

    #[test]
    fn unknown_payload_tag_fails() {
        let result: Result<DatumValue, _> =
            serde_json::from_str("{\"data_type\":\"mood\",\"level\":3}");
        assert!(result.is_err());
    }
}
