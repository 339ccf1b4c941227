use chrono::{Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use oil_core::export::{self, ExportFormat};
use oil_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "oiltrack")]
#[command(about = "Fleet lubricant consumption tracker", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Oil kind to operate on (black, gear)
    #[arg(long, global = true, default_value = "black")]
    kind: OilKind,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new vehicle record
    Add {
        /// Plate number for the new record
        #[arg(long)]
        plate: Option<String>,
    },

    /// Edit one field of a record
    Set {
        /// Record id
        id: String,

        /// Field name (plate_number, next_service, total_mileage,
        /// entry_date, consumed_mileage, update_date)
        field: String,

        /// New value
        #[arg(allow_hyphen_values = true)]
        value: String,

        /// Confirm a downward correction of consumed mileage without prompting
        #[arg(long)]
        yes: bool,
    },

    /// List records with remaining distance and status
    List,

    /// Check the fleet for vehicles needing an oil change
    Alerts,

    /// Delete a record permanently
    Delete {
        /// Record id
        id: String,

        /// Delete without prompting
        #[arg(long)]
        yes: bool,
    },

    /// Seed an empty fleet with sample black-oil records
    Demo,

    /// Export records to a dated JSON or CSV file
    Export {
        /// Output format (json, csv)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Output directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Periodically reload the fleet and re-run the alert check
    Watch {
        /// Seconds between reloads
        #[arg(long)]
        interval: Option<u64>,

        /// Stop after this many reloads
        #[arg(long)]
        iterations: Option<u64>,

        /// Enable polling even if the config leaves it off
        #[arg(long)]
        auto_refresh: bool,
    },
}

fn main() -> ExitCode {
    // Initialize logging
    oil_core::logging::init_with_level("warn");

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli.data_dir.unwrap_or_else(|| config.data.data_dir.clone());
    let state_path = FleetState::path_in(&data_dir);
    let kind = cli.kind;

    match cli.command {
        Commands::Add { plate } => cmd_add(&state_path, kind, plate),
        Commands::Set {
            id,
            field,
            value,
            yes,
        } => cmd_set(&state_path, kind, &id, &field, &value, yes),
        Commands::List => cmd_list(&state_path, kind),
        Commands::Alerts => cmd_alerts(&state_path, kind),
        Commands::Delete { id, yes } => cmd_delete(&state_path, kind, &id, yes),
        Commands::Demo => cmd_demo(&state_path),
        Commands::Export { format, out_dir } => {
            let format = format.unwrap_or(config.export.format);
            let dir = out_dir
                .or_else(|| config.export.dir.clone())
                .unwrap_or_else(|| PathBuf::from("."));
            cmd_export(&state_path, kind, format, &dir)
        }
        Commands::Watch {
            interval,
            iterations,
            auto_refresh,
        } => {
            if !(auto_refresh || config.refresh.auto_refresh) {
                println!(
                    "Auto-refresh is disabled. Set refresh.auto_refresh in the config or pass --auto-refresh."
                );
                return Ok(());
            }
            let interval = interval.unwrap_or(config.refresh.interval_secs).max(1);
            cmd_watch(&state_path, kind, Duration::from_secs(interval), iterations)
        }
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn cmd_add(state_path: &Path, kind: OilKind, plate: Option<String>) -> Result<()> {
    let mut state = FleetState::load(state_path)?;
    let store = state.store_mut(kind);

    let temp_id = u64::try_from(Utc::now().timestamp_millis()).unwrap_or_default();
    let key = store.add_new(temp_id, today());
    if let Some(plate) = plate {
        store.apply_edit(key, Field::PlateNumber, &plate, Confirmation::Unconfirmed)?;
    }

    state.save(state_path)?;

    // Temp id was promoted in place; new rows sit at the front
    let record = &state.store(kind).records()[0];
    println!("✓ Added {} record {}", kind.label(), record.key);
    Ok(())
}

fn cmd_set(
    state_path: &Path,
    kind: OilKind,
    id: &str,
    field: &str,
    value: &str,
    yes: bool,
) -> Result<()> {
    let key: RecordKey = id.parse()?;
    let field: Field = field.parse()?;

    let mut state = FleetState::load(state_path)?;
    let store = state.store_mut(kind);
    let before = store
        .get(key)
        .cloned()
        .ok_or_else(|| Error::RecordNotFound(key.to_string()))?;

    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        Confirmation::Unconfirmed
    };

    let result = store.apply_edit(key, field, value, confirmation).map(|_| ());
    match result {
        Ok(()) => {}
        Err(Error::Rejected(Rejection::RequiresConfirmation { from, to })) => {
            if !prompt_confirm(&format!(
                "Reduce consumed mileage from {} to {}? [y/N] ",
                from, to
            ))? {
                println!("Update cancelled; consumed mileage stays at {}", from);
                return Err(Rejection::RequiresConfirmation { from, to }.into());
            }
            store.apply_edit(key, field, value, Confirmation::Confirmed)?;
        }
        Err(e) => return Err(e),
    }

    if store.get(key) == Some(&before) {
        println!("No change to {} of record {}", field, key);
        return Ok(());
    }

    if field.is_mileage() {
        store.set_update_date(key, today())?;
    }

    // Saving never reorders, but may promote a temporary key
    let index = store
        .records()
        .iter()
        .position(|r| r.key == key)
        .ok_or_else(|| Error::RecordNotFound(key.to_string()))?;
    state.save(state_path)?;

    let record = &state.store(kind).records()[index];
    println!("✓ Updated {} of record {}", field, record.key);
    print_record(record, kind);
    Ok(())
}

fn cmd_list(state_path: &Path, kind: OilKind) -> Result<()> {
    let state = FleetState::load(state_path)?;
    let store = state.store(kind);

    if store.is_empty() {
        println!("No {} records. Add one with `oiltrack add`.", kind.label());
        return Ok(());
    }

    println!(
        "{:>6}  {:<12} {:>10} {:>10} {:>10}  {:<8} {:<8} {:<12} {:<12}",
        "ID", "PLATE", "TOTAL", "CONSUMED", "REMAINING", "STATUS", "FLAG", "NEXT SVC", "UPDATED"
    );
    for record in store {
        print_record(record, kind);
    }
    Ok(())
}

fn cmd_alerts(state_path: &Path, kind: OilKind) -> Result<()> {
    let state = FleetState::load(state_path)?;
    let report = state.store(kind).scan_alerts(kind);
    print_report(&report, kind);
    Ok(())
}

fn cmd_delete(state_path: &Path, kind: OilKind, id: &str, yes: bool) -> Result<()> {
    let key: RecordKey = id.parse()?;

    let mut state = FleetState::load(state_path)?;
    let plate = state
        .store(kind)
        .get(key)
        .map(|r| r.display_plate().to_string())
        .ok_or_else(|| Error::RecordNotFound(key.to_string()))?;

    if !yes && !prompt_confirm(&format!("Delete record {} ({})? [y/N] ", key, plate))? {
        println!("Delete cancelled; record {} kept", key);
        return Err(Error::Other(format!("delete of record {} not confirmed", key)));
    }

    let removed = state.store_mut(kind).remove(key)?;
    state.save(state_path)?;

    println!(
        "✓ Deleted {} record {} ({})",
        kind.label(),
        removed.key,
        removed.display_plate()
    );
    Ok(())
}

fn cmd_demo(state_path: &Path) -> Result<()> {
    let mut state = FleetState::load(state_path)?;
    if !state.black_oil.is_empty() || !state.gear_oil.is_empty() {
        return Err(Error::Other(
            "fleet already has records; demo data is only loaded into an empty fleet".into(),
        ));
    }

    state.black_oil = RecordStore::demo();
    state.save(state_path)?;

    println!("✓ Loaded {} sample black oil records", state.black_oil.len());
    Ok(())
}

fn cmd_export(state_path: &Path, kind: OilKind, format: ExportFormat, dir: &Path) -> Result<()> {
    let state = FleetState::load(state_path)?;
    let records = state.store(kind).records();

    let path = export::export(records, kind, dir, format, today())?;
    println!("✓ Exported {} records to {}", records.len(), path.display());
    Ok(())
}

fn cmd_watch(
    state_path: &Path,
    kind: OilKind,
    interval: Duration,
    iterations: Option<u64>,
) -> Result<()> {
    let mut round = 0;
    loop {
        round += 1;

        // Reloads race with edits from other processes; the next save from
        // a stale copy is refused by the revision check.
        match FleetState::load(state_path) {
            Ok(state) => {
                println!("── {} (revision {})", Local::now().format("%H:%M:%S"), state.revision);
                print_report(&state.store(kind).scan_alerts(kind), kind);
            }
            Err(e) => tracing::warn!("Reload failed: {}", e),
        }

        if iterations.is_some_and(|n| round >= n) {
            return Ok(());
        }
        std::thread::sleep(interval);
    }
}

fn print_record(record: &LubricantRecord, kind: OilKind) {
    let severity = classify(record.remaining_mileage, kind);
    let emphasis = row_emphasis(
        Some(record.remaining_mileage),
        Some(record.update_date),
        today(),
    )
    .map(|tag| tag.to_string())
    .unwrap_or_default();

    println!(
        "{:>6}  {:<12} {:>10} {:>10} {:>10}  {:<8} {:<8} {:<12} {:<12}",
        record.key.to_string(),
        record.display_plate(),
        record.total_mileage,
        record.consumed_mileage,
        record.remaining_mileage,
        severity.to_string(),
        emphasis,
        record.next_service.to_string(),
        record.update_date.to_string(),
    );
}

fn print_report(report: &AlertReport, kind: OilKind) {
    println!("{} check: {} alert(s)", capitalize(kind.label()), report.count);
    for message in &report.messages {
        println!("  ⚠ {}", message);
    }
    if report.is_clear() {
        println!("  ✓ All vehicles' {} is in good condition", kind.label());
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn prompt_confirm(question: &str) -> Result<bool> {
    print!("{}", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    Ok(matches!(input.trim().to_lowercase().as_str(), "y" | "yes"))
}
