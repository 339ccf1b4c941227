//! Export of a record collection to JSON or CSV files.
//!
//! Files are named after the oil kind and the export date, e.g.
//! `black-oil-data-2024-05-15.json`.

use crate::{Error, LubricantRecord, OilKind, RecordKey, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Output format for exports
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    #[default]
    Json,
    Csv,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Csv => "csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(Error::Other(format!("Unknown export format: {}", other))),
        }
    }
}

/// A row in the CSV output
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    id: Option<u64>,
    #[serde(rename = "tempId")]
    temp_id: Option<u64>,
    plate_number: &'a str,
    next_service: String,
    total_mileage: f64,
    entry_date: String,
    consumed_mileage: f64,
    update_date: String,
    remaining_mileage: f64,
}

impl<'a> From<&'a LubricantRecord> for CsvRow<'a> {
    fn from(record: &'a LubricantRecord) -> Self {
        let (id, temp_id) = match record.key {
            RecordKey::Persisted(id) => (Some(id), None),
            RecordKey::Temp(id) => (None, Some(id)),
        };
        CsvRow {
            id,
            temp_id,
            plate_number: &record.plate_number,
            next_service: record.next_service.to_string(),
            total_mileage: record.total_mileage,
            entry_date: record.entry_date.to_string(),
            consumed_mileage: record.consumed_mileage,
            update_date: record.update_date.to_string(),
            remaining_mileage: record.remaining_mileage,
        }
    }
}

/// File name for an export taken on `date`
pub fn export_file_name(kind: OilKind, date: NaiveDate, format: ExportFormat) -> String {
    format!(
        "{}-oil-data-{}.{}",
        kind.as_str(),
        date.format("%Y-%m-%d"),
        format.extension()
    )
}

/// Write records as a pretty-printed JSON array
pub fn write_json(records: &[LubricantRecord], path: &Path) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, records)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Write records as CSV with a header row
pub fn write_csv(records: &[LubricantRecord], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(CsvRow::from(record))?;
    }
    writer.flush()?;
    Ok(())
}

/// Export records into `dir` under the dated file name; returns the file path
pub fn export(
    records: &[LubricantRecord],
    kind: OilKind,
    dir: &Path,
    format: ExportFormat,
    date: NaiveDate,
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(kind, date, format));

    match format {
        ExportFormat::Json => write_json(records, &path)?,
        ExportFormat::Csv => write_csv(records, &path)?,
    }

    tracing::info!("Exported {} {} records to {:?}", records.len(), kind.label(), path);
    Ok(path)
}
