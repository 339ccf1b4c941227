//! Core domain types for the fleet lubricant tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - Oil kinds and their threshold tables
//! - Record keys (persisted ids and pending temporary ids)
//! - The lubricant record itself and its editable fields
//! - Classification outputs (severity bands and emphasis tags)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

// ============================================================================
// Oil Kinds
// ============================================================================

/// Lubricant type tracked by the fleet
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OilKind {
    Black,
    Gear,
}

impl OilKind {
    /// Inclusive `(danger, warning)` remaining-distance thresholds in km.
    pub fn thresholds(self) -> (f64, f64) {
        match self {
            OilKind::Black => (500.0, 1000.0),
            OilKind::Gear => (5000.0, 10000.0),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OilKind::Black => "black",
            OilKind::Gear => "gear",
        }
    }

    /// Human-readable label, e.g. "black oil"
    pub fn label(self) -> &'static str {
        match self {
            OilKind::Black => "black oil",
            OilKind::Gear => "gear oil",
        }
    }
}

impl fmt::Display for OilKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OilKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "black" | "black_oil" | "black-oil" => Ok(OilKind::Black),
            "gear" | "gear_oil" | "gear-oil" => Ok(OilKind::Gear),
            other => Err(Error::UnknownOilKind(other.to_string())),
        }
    }
}

// ============================================================================
// Record Keys
// ============================================================================

/// Identifier of a record: a persisted id, or a temporary client-side id
/// assigned to a row that has not been saved yet.
///
/// Serialized as a single `"id"` or `"tempId"` entry so exactly one of the
/// two is ever present in the record shape.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RecordKey {
    #[serde(rename = "id")]
    Persisted(u64),
    #[serde(rename = "tempId")]
    Temp(u64),
}

impl RecordKey {
    pub fn is_temp(&self) -> bool {
        matches!(self, RecordKey::Temp(_))
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKey::Persisted(id) => write!(f, "{}", id),
            RecordKey::Temp(id) => write!(f, "tmp-{}", id),
        }
    }
}

impl FromStr for RecordKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix("tmp-") {
            Some(rest) => rest.parse().map(RecordKey::Temp),
            None => s.parse().map(RecordKey::Persisted),
        };
        parsed.map_err(|_| Error::RecordNotFound(s.to_string()))
    }
}

// ============================================================================
// Lubricant Record
// ============================================================================

/// One vehicle's lubricant fill, tracked by odometer counters.
///
/// The oil kind is not part of the record shape; it is implied by the store
/// the record lives in.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct LubricantRecord {
    #[serde(flatten)]
    pub key: RecordKey,
    pub plate_number: String,
    pub next_service: NaiveDate,
    pub total_mileage: f64,
    pub entry_date: NaiveDate,
    pub consumed_mileage: f64,
    pub update_date: NaiveDate,
    pub remaining_mileage: f64,
}

impl LubricantRecord {
    /// A freshly added row: all counters zero, every date set to `today`.
    pub fn new_row(temp_id: u64, today: NaiveDate) -> Self {
        Self {
            key: RecordKey::Temp(temp_id),
            plate_number: String::new(),
            next_service: today,
            total_mileage: 0.0,
            entry_date: today,
            consumed_mileage: 0.0,
            update_date: today,
            remaining_mileage: 0.0,
        }
    }

    /// Plate number, or "unnamed" when blank
    pub fn display_plate(&self) -> &str {
        let plate = self.plate_number.trim();
        if plate.is_empty() {
            "unnamed"
        } else {
            plate
        }
    }
}

/// Editable fields of a record, named as they appear in the record shape.
///
/// `remaining_mileage` is deliberately absent: it is always derived.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Field {
    PlateNumber,
    NextService,
    TotalMileage,
    EntryDate,
    ConsumedMileage,
    UpdateDate,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::PlateNumber,
        Field::NextService,
        Field::TotalMileage,
        Field::EntryDate,
        Field::ConsumedMileage,
        Field::UpdateDate,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::PlateNumber => "plate_number",
            Field::NextService => "next_service",
            Field::TotalMileage => "total_mileage",
            Field::EntryDate => "entry_date",
            Field::ConsumedMileage => "consumed_mileage",
            Field::UpdateDate => "update_date",
        }
    }

    pub fn is_mileage(self) -> bool {
        matches!(self, Field::TotalMileage | Field::ConsumedMileage)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|field| field.as_str() == s.trim())
            .ok_or_else(|| Error::UnknownField(s.to_string()))
    }
}

/// Whether the caller has explicitly confirmed a downward correction
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Confirmation {
    #[default]
    Unconfirmed,
    Confirmed,
}

// ============================================================================
// Classification Outputs
// ============================================================================

/// Severity band of a record's remaining distance
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Danger,
    Warning,
    Safe,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Danger => "danger",
            Severity::Warning => "warning",
            Severity::Safe => "safe",
        };
        f.write_str(s)
    }
}

/// Presentation-only hint explaining why a row deserves attention.
/// Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmphasisTag {
    CriticalTint,
    WarningTint,
    StaleTint,
}

impl fmt::Display for EmphasisTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EmphasisTag::CriticalTint => "critical",
            EmphasisTag::WarningTint => "warning",
            EmphasisTag::StaleTint => "stale",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LubricantRecord {
        LubricantRecord {
            key: RecordKey::Persisted(1),
            plate_number: "QM8517L".into(),
            next_service: NaiveDate::from_ymd_opt(2024, 5, 15).unwrap(),
            total_mileage: 85000.0,
            entry_date: NaiveDate::from_ymd_opt(2023, 5, 15).unwrap(),
            consumed_mileage: 82000.0,
            update_date: NaiveDate::from_ymd_opt(2023, 11, 20).unwrap(),
            remaining_mileage: 3000.0,
        }
    }

    #[test]
    fn test_record_shape_uses_external_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["id"], 1);
        assert!(!obj.contains_key("tempId"));
        assert_eq!(obj["plate_number"], "QM8517L");
        assert_eq!(obj["next_service"], "2024-05-15");
        assert_eq!(obj["entry_date"], "2023-05-15");
        assert_eq!(obj["update_date"], "2023-11-20");
        assert_eq!(obj["remaining_mileage"], 3000.0);
    }

    #[test]
    fn test_temp_key_serializes_as_temp_id() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let record = LubricantRecord::new_row(1700000000000, today);
        let value = serde_json::to_value(&record).unwrap();
        let obj = value.as_object().unwrap();

        assert_eq!(obj["tempId"], 1700000000000u64);
        assert!(!obj.contains_key("id"));

        let parsed: LubricantRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_deserialize_integer_mileage() {
        let json = r#"{
            "id": 2,
            "plate_number": "QAA2805W",
            "next_service": "2024-03-10",
            "total_mileage": 120000,
            "entry_date": "2023-03-10",
            "consumed_mileage": 118000,
            "update_date": "2023-10-25",
            "remaining_mileage": 2000
        }"#;
        let record: LubricantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.key, RecordKey::Persisted(2));
        assert_eq!(record.remaining_mileage, 2000.0);
    }

    #[test]
    fn test_new_row_defaults() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let record = LubricantRecord::new_row(7, today);

        assert!(record.key.is_temp());
        assert_eq!(record.total_mileage, 0.0);
        assert_eq!(record.consumed_mileage, 0.0);
        assert_eq!(record.remaining_mileage, 0.0);
        assert_eq!(record.entry_date, today);
        assert_eq!(record.next_service, today);
        assert_eq!(record.update_date, today);
        assert_eq!(record.display_plate(), "unnamed");
    }

    #[test]
    fn test_record_key_parse_and_display() {
        assert_eq!("42".parse::<RecordKey>().unwrap(), RecordKey::Persisted(42));
        assert_eq!("tmp-9".parse::<RecordKey>().unwrap(), RecordKey::Temp(9));
        assert_eq!(RecordKey::Temp(9).to_string(), "tmp-9");
        assert!("abc".parse::<RecordKey>().is_err());
    }

    #[test]
    fn test_field_parse() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().unwrap(), field);
        }
        assert!(matches!(
            "remaining_mileage".parse::<Field>(),
            Err(Error::UnknownField(_))
        ));
    }

    #[test]
    fn test_oil_kind_parse() {
        assert_eq!("Black".parse::<OilKind>().unwrap(), OilKind::Black);
        assert_eq!("gear-oil".parse::<OilKind>().unwrap(), OilKind::Gear);
        assert!("diesel".parse::<OilKind>().is_err());
    }
}
