//! Lifecycle engine for lubricant records.
//!
//! Pure functions over one record at a time:
//! - Validate a proposed field edit and return the updated record
//! - Recompute remaining distance from the mileage counters
//! - Cascade `entry_date` edits into `next_service`
//!
//! Nothing here mutates its input; a rejected edit leaves the caller's record
//! untouched by construction.

use crate::{Confirmation, Field, LubricantRecord, Rejection};
use chrono::{Months, NaiveDate};

/// Lowest remaining distance (km) an edit may produce
pub const MIN_RESIDUAL_KM: f64 = -2000.0;

/// Date format accepted for date fields
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Validate a proposed edit and return the record with the edit applied.
///
/// ## Rules
///
/// 1. **Mileage fields** (`total_mileage`, `consumed_mileage`):
///    - Text must parse to a finite number ≥ 0 → else `InvalidMileage`
///    - Lowering `consumed_mileage` needs `Confirmation::Confirmed`
///      → else `RequiresConfirmation`
///    - `total - consumed` (proposed value for the edited counter, stored
///      value for the other) must be ≥ -2000 → else `BelowMinimumResidual`
///    - On success `remaining_mileage` is set to that difference
///
/// 2. **Date fields** must parse as `YYYY-MM-DD` → else `InvalidDate`.
///    Editing `entry_date` always overwrites `next_service` with the same
///    day one calendar year later.
///
/// 3. **`plate_number`** is free text.
///
/// Re-submitting the value already stored is a no-op: the record comes back
/// unchanged, without cascades or confirmation prompts. `update_date` is left
/// to the caller.
pub fn validate_and_apply(
    record: &LubricantRecord,
    field: Field,
    raw: &str,
    confirmation: Confirmation,
) -> Result<LubricantRecord, Rejection> {
    let mut next = record.clone();

    match field {
        Field::PlateNumber => {
            next.plate_number = raw.to_string();
        }

        Field::TotalMileage | Field::ConsumedMileage => {
            let value = parse_mileage(raw)?;
            let current = mileage(record, field);

            if value == current {
                return Ok(next);
            }

            if field == Field::ConsumedMileage
                && value < current
                && confirmation != Confirmation::Confirmed
            {
                tracing::debug!(
                    "Consumed mileage decrease {} -> {} needs confirmation",
                    current,
                    value
                );
                return Err(Rejection::RequiresConfirmation {
                    from: current,
                    to: value,
                });
            }

            let (total, consumed) = match field {
                Field::TotalMileage => (value, record.consumed_mileage),
                _ => (record.total_mileage, value),
            };

            let diff = total - consumed;
            if diff < MIN_RESIDUAL_KM {
                tracing::debug!("Rejecting {} = {}: residual {} km", field, value, diff);
                return Err(Rejection::BelowMinimumResidual { diff });
            }

            match field {
                Field::TotalMileage => next.total_mileage = value,
                _ => next.consumed_mileage = value,
            }
            next.remaining_mileage = diff;
        }

        Field::EntryDate => {
            let date = parse_date(raw)?;
            if date == record.entry_date {
                return Ok(next);
            }
            next.entry_date = date;
            next.next_service = next_service_after(date);
        }

        Field::NextService => {
            next.next_service = parse_date(raw)?;
        }

        Field::UpdateDate => {
            next.update_date = parse_date(raw)?;
        }
    }

    Ok(next)
}

/// Remaining distance for the given counters
pub fn remaining(total: f64, consumed: f64) -> f64 {
    total - consumed
}

/// Recompute `remaining_mileage` from the stored counters.
///
/// Applied to every record when fleet state is loaded, since files written by
/// other tools may carry a stale remaining value.
pub fn recompute(record: &mut LubricantRecord) {
    record.remaining_mileage = remaining(record.total_mileage, record.consumed_mileage);
}

/// Service due date for a fill entered on `entry`: same month and day one
/// calendar year later.
///
/// Feb 29 maps to Feb 28 of the following (non-leap) year.
pub fn next_service_after(entry: NaiveDate) -> NaiveDate {
    // Only overflows at NaiveDate::MAX
    entry.checked_add_months(Months::new(12)).unwrap_or(entry)
}

/// Parse mileage text into a finite, non-negative number
pub fn parse_mileage(raw: &str) -> Result<f64, Rejection> {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(Rejection::InvalidMileage(trimmed.to_string())),
    }
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(raw: &str) -> Result<NaiveDate, Rejection> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| Rejection::InvalidDate(trimmed.to_string()))
}

fn mileage(record: &LubricantRecord, field: Field) -> f64 {
    match field {
        Field::TotalMileage => record.total_mileage,
        _ => record.consumed_mileage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RecordKey;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_record() -> LubricantRecord {
        LubricantRecord {
            key: RecordKey::Persisted(1),
            plate_number: "QM8517L".into(),
            next_service: date(2024, 5, 15),
            total_mileage: 85000.0,
            entry_date: date(2023, 5, 15),
            consumed_mileage: 82000.0,
            update_date: date(2023, 11, 20),
            remaining_mileage: 3000.0,
        }
    }

    fn apply(record: &LubricantRecord, field: Field, raw: &str) -> Result<LubricantRecord, Rejection> {
        validate_and_apply(record, field, raw, Confirmation::Unconfirmed)
    }

    #[test]
    fn test_consumed_increase_recomputes_remaining() {
        let record = create_test_record();

        let updated = apply(&record, Field::ConsumedMileage, "83500").unwrap();
        assert_eq!(updated.consumed_mileage, 83500.0);
        assert_eq!(updated.remaining_mileage, 1500.0);

        let updated = apply(&updated, Field::ConsumedMileage, "84600").unwrap();
        assert_eq!(updated.remaining_mileage, 400.0);
    }

    #[test]
    fn test_total_change_uses_stored_consumed() {
        let record = create_test_record();
        let updated = apply(&record, Field::TotalMileage, "90000").unwrap();

        assert_eq!(updated.total_mileage, 90000.0);
        assert_eq!(updated.consumed_mileage, 82000.0);
        assert_eq!(updated.remaining_mileage, 8000.0);
    }

    #[test]
    fn test_remaining_equals_difference_across_range() {
        let record = create_test_record();
        for consumed in [0.0, 1.5, 42000.0, 85000.0, 86999.0, 87000.0] {
            let mut base = record.clone();
            base.consumed_mileage = 0.0;
            base.remaining_mileage = 85000.0;
            let updated =
                apply(&base, Field::ConsumedMileage, &consumed.to_string()).unwrap();
            assert_eq!(updated.remaining_mileage, 85000.0 - consumed);
        }
    }

    #[test]
    fn test_invalid_mileage_rejected() {
        let record = create_test_record();
        for raw in ["", "abc", "-1", "NaN", "inf", "12km"] {
            let result = apply(&record, Field::TotalMileage, raw);
            assert!(
                matches!(result, Err(Rejection::InvalidMileage(_))),
                "expected InvalidMileage for {:?}",
                raw
            );
        }
    }

    #[test]
    fn test_mileage_text_is_trimmed() {
        let record = create_test_record();
        let updated = apply(&record, Field::ConsumedMileage, " 83000 ").unwrap();
        assert_eq!(updated.consumed_mileage, 83000.0);
    }

    #[test]
    fn test_consumed_decrease_requires_confirmation() {
        let mut record = create_test_record();
        record.consumed_mileage = 84600.0;
        record.remaining_mileage = 400.0;

        let result = apply(&record, Field::ConsumedMileage, "82000");
        assert_eq!(
            result,
            Err(Rejection::RequiresConfirmation {
                from: 84600.0,
                to: 82000.0
            })
        );

        let updated = validate_and_apply(
            &record,
            Field::ConsumedMileage,
            "82000",
            Confirmation::Confirmed,
        )
        .unwrap();
        assert_eq!(updated.consumed_mileage, 82000.0);
        assert_eq!(updated.remaining_mileage, 3000.0);
    }

    #[test]
    fn test_total_decrease_needs_no_confirmation() {
        let record = create_test_record();
        let updated = apply(&record, Field::TotalMileage, "84000").unwrap();
        assert_eq!(updated.remaining_mileage, 2000.0);
    }

    #[test]
    fn test_below_minimum_residual_rejected() {
        let record = create_test_record();
        let result = apply(&record, Field::ConsumedMileage, "87200");
        assert_eq!(
            result,
            Err(Rejection::BelowMinimumResidual { diff: -2200.0 })
        );
    }

    #[test]
    fn test_residual_floor_is_inclusive() {
        let record = create_test_record();
        let updated = apply(&record, Field::ConsumedMileage, "87000").unwrap();
        assert_eq!(updated.remaining_mileage, -2000.0);
    }

    #[test]
    fn test_total_lowered_below_floor_rejected() {
        let record = create_test_record();
        let result = apply(&record, Field::TotalMileage, "79000");
        assert_eq!(
            result,
            Err(Rejection::BelowMinimumResidual { diff: -3000.0 })
        );
    }

    #[test]
    fn test_confirmed_decrease_still_checks_residual() {
        let mut record = create_test_record();
        record.total_mileage = 1000.0;
        record.consumed_mileage = 2500.0;
        record.remaining_mileage = -1500.0;

        // Lowering total with consumed above it
        let result = validate_and_apply(
            &record,
            Field::TotalMileage,
            "0",
            Confirmation::Confirmed,
        );
        assert!(matches!(
            result,
            Err(Rejection::BelowMinimumResidual { .. })
        ));
    }

    #[test]
    fn test_same_value_is_noop() {
        let mut record = create_test_record();
        // Manual override that a cascade would clobber
        record.next_service = date(2024, 1, 1);

        for (field, raw) in [
            (Field::TotalMileage, "85000"),
            (Field::ConsumedMileage, "82000"),
            (Field::EntryDate, "2023-05-15"),
            (Field::PlateNumber, "QM8517L"),
            (Field::UpdateDate, "2023-11-20"),
        ] {
            let updated = apply(&record, field, raw).unwrap();
            assert_eq!(updated, record, "field {} was not a no-op", field);
        }
    }

    #[test]
    fn test_noop_preserves_unrecomputed_remaining() {
        let mut record = create_test_record();
        record.remaining_mileage = 1234.0;

        let updated = apply(&record, Field::ConsumedMileage, "82000").unwrap();
        assert_eq!(updated.remaining_mileage, 1234.0);
    }

    #[test]
    fn test_entry_date_cascades_next_service() {
        let mut record = create_test_record();
        record.entry_date = date(2022, 1, 1);

        let updated = apply(&record, Field::EntryDate, "2023-05-15").unwrap();
        assert_eq!(updated.entry_date, date(2023, 5, 15));
        assert_eq!(updated.next_service, date(2024, 5, 15));
    }

    #[test]
    fn test_entry_date_cascade_overwrites_override() {
        let mut record = create_test_record();
        record.next_service = date(2030, 1, 1);

        let updated = apply(&record, Field::EntryDate, "2023-06-01").unwrap();
        assert_eq!(updated.next_service, date(2024, 6, 1));
    }

    #[test]
    fn test_leap_day_entry_clamps_to_feb_28() {
        let record = create_test_record();
        let updated = apply(&record, Field::EntryDate, "2024-02-29").unwrap();
        assert_eq!(updated.next_service, date(2025, 2, 28));
    }

    #[test]
    fn test_next_service_edit_does_not_cascade() {
        let record = create_test_record();
        let updated = apply(&record, Field::NextService, "2024-09-01").unwrap();

        assert_eq!(updated.next_service, date(2024, 9, 1));
        assert_eq!(updated.entry_date, record.entry_date);
    }

    #[test]
    fn test_invalid_date_rejected() {
        let record = create_test_record();
        for field in [Field::EntryDate, Field::NextService, Field::UpdateDate] {
            let result = apply(&record, field, "15/05/2023");
            assert!(matches!(result, Err(Rejection::InvalidDate(_))));
        }
        assert!(apply(&record, Field::EntryDate, "2023-02-30").is_err());
    }

    #[test]
    fn test_update_date_is_not_stamped() {
        let record = create_test_record();
        let updated = apply(&record, Field::ConsumedMileage, "83000").unwrap();
        assert_eq!(updated.update_date, record.update_date);
    }

    #[test]
    fn test_plate_number_is_free_text() {
        let record = create_test_record();
        let updated = apply(&record, Field::PlateNumber, "  粤B 12345 ").unwrap();
        assert_eq!(updated.plate_number, "  粤B 12345 ");
        assert_eq!(updated.remaining_mileage, record.remaining_mileage);
    }

    #[test]
    fn test_recompute() {
        let mut record = create_test_record();
        record.remaining_mileage = 0.0;
        recompute(&mut record);
        assert_eq!(record.remaining_mileage, 3000.0);
    }
}
