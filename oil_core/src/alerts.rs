//! Fleet-wide alert scan.

use crate::severity::classify;
use crate::{LubricantRecord, OilKind, Severity};

/// Result of scanning a fleet for records needing attention
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AlertReport {
    /// Number of records that contributed at least one message
    pub count: usize,
    /// Messages in store order
    pub messages: Vec<String>,
}

impl AlertReport {
    pub fn is_clear(&self) -> bool {
        self.count == 0
    }
}

/// Scan records of one oil kind and report every record not in the Safe band.
///
/// Read-only; messages follow iteration order, not severity.
pub fn scan_alerts<'a, I>(records: I, kind: OilKind) -> AlertReport
where
    I: IntoIterator<Item = &'a LubricantRecord>,
{
    let mut report = AlertReport::default();

    for record in records {
        let remaining = record.remaining_mileage;
        let message = match classify(remaining, kind) {
            Severity::Danger => format!(
                "Plate {}: {} km remaining, replace immediately",
                record.display_plate(),
                remaining
            ),
            Severity::Warning => format!(
                "Plate {}: {} km remaining, replace soon",
                record.display_plate(),
                remaining
            ),
            Severity::Safe => continue,
        };

        report.count += 1;
        report.messages.push(message);
    }

    tracing::debug!("{} scan found {} alerts", kind.label(), report.count);
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordKey;
    use chrono::NaiveDate;

    fn record(id: u64, plate: &str, remaining: f64) -> LubricantRecord {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut record = LubricantRecord::new_row(id, today);
        record.key = RecordKey::Persisted(id);
        record.plate_number = plate.into();
        record.total_mileage = remaining.max(0.0);
        record.remaining_mileage = remaining;
        record
    }

    #[test]
    fn test_scan_black_oil() {
        let records = vec![
            record(1, "SAFE1", 3000.0),
            record(2, "WARN1", 800.0),
            record(3, "CRIT1", 400.0),
            record(4, "", -100.0),
        ];

        let report = scan_alerts(&records, OilKind::Black);

        assert_eq!(report.count, 3);
        assert_eq!(
            report.messages,
            vec![
                "Plate WARN1: 800 km remaining, replace soon".to_string(),
                "Plate CRIT1: 400 km remaining, replace immediately".to_string(),
                "Plate unnamed: -100 km remaining, replace immediately".to_string(),
            ]
        );
    }

    #[test]
    fn test_scan_uses_gear_thresholds() {
        let records = vec![record(1, "G1", 3000.0), record(2, "G2", 9000.0)];

        let report = scan_alerts(&records, OilKind::Gear);
        assert_eq!(report.count, 2);
        assert!(report.messages[0].ends_with("replace immediately"));
        assert!(report.messages[1].ends_with("replace soon"));

        let report = scan_alerts(&records, OilKind::Black);
        assert!(report.is_clear());
    }

    #[test]
    fn test_scan_empty() {
        let records: Vec<LubricantRecord> = Vec::new();
        let report = scan_alerts(&records, OilKind::Black);
        assert!(report.is_clear());
        assert!(report.messages.is_empty());
    }
}
