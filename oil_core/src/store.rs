//! Ordered in-memory collection of lubricant records.
//!
//! The store is owned by its caller; there is no process-wide instance.
//! Every mutation goes through the lifecycle engine and replaces a record
//! wholesale, so readers never observe a half-applied edit.

use crate::alerts::{scan_alerts, AlertReport};
use crate::engine::{next_service_after, recompute, validate_and_apply};
use crate::{Confirmation, Error, Field, LubricantRecord, OilKind, RecordKey, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Records of a single oil kind, newest first
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct RecordStore {
    records: Vec<LubricantRecord>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<LubricantRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[LubricantRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &LubricantRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, key: RecordKey) -> Option<&LubricantRecord> {
        self.records.iter().find(|r| r.key == key)
    }

    /// First record whose plate matches, ignoring case and surrounding blanks
    pub fn find_by_plate(&self, plate: &str) -> Option<&LubricantRecord> {
        let plate = plate.trim();
        self.records
            .iter()
            .find(|r| r.plate_number.trim().eq_ignore_ascii_case(plate))
    }

    /// Insert a blank row at the front under a temporary id.
    ///
    /// `temp_id` is usually the clock in milliseconds; it is bumped until it
    /// no longer collides with an existing temporary id.
    pub fn add_new(&mut self, temp_id: u64, today: NaiveDate) -> RecordKey {
        let mut id = temp_id;
        while self.get(RecordKey::Temp(id)).is_some() {
            id += 1;
        }

        let record = LubricantRecord::new_row(id, today);
        let key = record.key;
        self.records.insert(0, record);
        tracing::debug!("Added new row {}", key);
        key
    }

    /// Sample black-oil fleet for trying the tool out.
    ///
    /// Rows carry temporary ids and get persisted ids on first save.
    pub fn demo() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default();
        let row = |temp_id, plate: &str, entry: NaiveDate, total: f64, consumed: f64, updated| {
            let mut record = LubricantRecord::new_row(temp_id, entry);
            record.plate_number = plate.to_string();
            record.next_service = next_service_after(entry);
            record.total_mileage = total;
            record.consumed_mileage = consumed;
            record.update_date = updated;
            recompute(&mut record);
            record
        };

        Self::from_records(vec![
            row(1, "QM8517L", date(2023, 5, 15), 85000.0, 82000.0, date(2023, 11, 20)),
            row(2, "QAA2805W", date(2023, 3, 10), 120000.0, 118000.0, date(2023, 10, 25)),
        ])
    }

    /// Validate an edit with the lifecycle engine and commit it on success.
    ///
    /// On rejection the stored record is left exactly as it was.
    pub fn apply_edit(
        &mut self,
        key: RecordKey,
        field: Field,
        raw: &str,
        confirmation: Confirmation,
    ) -> Result<&LubricantRecord> {
        let index = self.position(key)?;
        let updated = validate_and_apply(&self.records[index], field, raw, confirmation)?;
        self.records[index] = updated;
        Ok(&self.records[index])
    }

    /// Stamp the date the counters were last revised
    pub fn set_update_date(&mut self, key: RecordKey, date: NaiveDate) -> Result<()> {
        let index = self.position(key)?;
        self.records[index].update_date = date;
        Ok(())
    }

    /// Remove a record permanently
    pub fn remove(&mut self, key: RecordKey) -> Result<LubricantRecord> {
        let index = self.position(key)?;
        let removed = self.records.remove(index);
        tracing::debug!("Removed record {}", key);
        Ok(removed)
    }

    /// Recompute remaining distance from the counters of every record.
    ///
    /// Returns the number of records whose stored value was out of date.
    pub fn recompute_all(&mut self) -> usize {
        let mut fixed = 0;
        for record in &mut self.records {
            let stored = record.remaining_mileage;
            recompute(record);
            if record.remaining_mileage != stored {
                tracing::debug!(
                    "Record {} remaining {} -> {}",
                    record.key,
                    stored,
                    record.remaining_mileage
                );
                fixed += 1;
            }
        }
        fixed
    }

    /// Replace every temporary id with a persisted one drawn from `next_id`.
    ///
    /// Oldest rows are numbered first. Returns `(temp, persisted)` pairs.
    pub fn assign_persisted_ids(&mut self, next_id: &mut u64) -> Vec<(u64, u64)> {
        let mut assigned = Vec::new();
        for record in self.records.iter_mut().rev() {
            if let RecordKey::Temp(temp) = record.key {
                record.key = RecordKey::Persisted(*next_id);
                assigned.push((temp, *next_id));
                *next_id += 1;
            }
        }
        assigned
    }

    /// Largest persisted id in the store
    pub fn max_persisted_id(&self) -> Option<u64> {
        self.records
            .iter()
            .filter_map(|r| match r.key {
                RecordKey::Persisted(id) => Some(id),
                RecordKey::Temp(_) => None,
            })
            .max()
    }

    pub fn scan_alerts(&self, kind: OilKind) -> AlertReport {
        scan_alerts(&self.records, kind)
    }

    fn position(&self, key: RecordKey) -> Result<usize> {
        self.records
            .iter()
            .position(|r| r.key == key)
            .ok_or_else(|| Error::RecordNotFound(key.to_string()))
    }
}

impl<'a> IntoIterator for &'a RecordStore {
    type Item = &'a LubricantRecord;
    type IntoIter = std::slice::Iter<'a, LubricantRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
