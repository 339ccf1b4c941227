//! Severity bands and row emphasis.

use crate::{EmphasisTag, OilKind, Severity};
use chrono::NaiveDate;

/// Days without a counter update after which a row counts as stale
pub const STALE_AFTER_DAYS: i64 = 3;

/// Classify remaining distance against the oil kind's threshold table.
///
/// Both thresholds are inclusive: exactly 500 km of black oil is Danger.
/// Negative distances are always Danger.
pub fn classify(remaining: f64, kind: OilKind) -> Severity {
    let (danger, warning) = kind.thresholds();
    if remaining <= danger {
        Severity::Danger
    } else if remaining <= warning {
        Severity::Warning
    } else {
        Severity::Safe
    }
}

/// Presentation hint for a row.
///
/// Mileage tints take precedence over staleness. Mileage bands are the
/// black-oil bands regardless of kind. No tint at all when `remaining` is
/// absent.
pub fn row_emphasis(
    remaining: Option<f64>,
    update_date: Option<NaiveDate>,
    today: NaiveDate,
) -> Option<EmphasisTag> {
    let remaining = remaining?;
    let (danger, warning) = OilKind::Black.thresholds();

    if remaining <= danger {
        return Some(EmphasisTag::CriticalTint);
    }
    if remaining <= warning {
        return Some(EmphasisTag::WarningTint);
    }

    let days_since_update = (today - update_date?).num_days();
    (days_since_update > STALE_AFTER_DAYS).then_some(EmphasisTag::StaleTint)
}
