use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Args, Subcommand};
use ifast_lib::progress::{fast_progress, format_duration, week_bars, DaySummary};
use ifast_lib::types::{FastRecord, FastType};
use ifast_lib::{validation, Db};
use uuid::Uuid;

use crate::commands::{parse_day, parse_time};
use crate::output::{
    field, format_percent, print_json, print_records, print_rows, print_week, OutputFormat,
};

#[derive(Args)]
pub struct FastArgs {
    #[command(subcommand)]
    pub command: FastCommand,
}

#[derive(Subcommand)]
pub enum FastCommand {
    /// Start a new fast
    Start {
        /// Fast type: 16:8, 14:10, 18:6, 24:0, custom
        #[arg(long = "type", default_value = "16:8")]
        fast_type: FastType,
        /// Start time (defaults to now)
        #[arg(long)]
        at: Option<String>,
        /// Notes for this fast
        #[arg(long)]
        notes: Option<String>,
    },
    /// End the fast in progress
    Stop {
        /// End time (defaults to now)
        #[arg(long)]
        at: Option<String>,
        /// Replace the notes on the record
        #[arg(long)]
        notes: Option<String>,
    },
    /// Set the notes of a record (empty text clears them)
    Note { id: Uuid, text: String },
    /// List local records, newest first
    List {
        /// Only records started in the last N days
        #[arg(long)]
        days: Option<i64>,
        /// Maximum number of records to show
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Show progress toward today's fasting goal
    Today {
        /// Day to summarize, YYYY-MM-DD (defaults to today, UTC)
        #[arg(long)]
        date: Option<String>,
    },
    /// Show the last seven days
    Week,
    /// Delete a local record
    Delete { id: Uuid },
}

pub fn run(args: &FastArgs, db: &Db, format: &OutputFormat) -> Result<()> {
    let now = Utc::now();
    match &args.command {
        FastCommand::Start {
            fast_type,
            at,
            notes,
        } => start(db, now, *fast_type, at.as_deref(), notes.as_deref(), format),
        FastCommand::Stop { at, notes } => stop(db, now, at.as_deref(), notes.as_deref(), format),
        FastCommand::Note { id, text } => {
            let notes = validation::validate_notes(text)?.unwrap_or_default();
            let record = db.update_record(*id, None, Some(&notes))?;
            print_records(&[record], format)
        }
        FastCommand::List { days, limit } => {
            let mut records = match days {
                Some(days) => {
                    let mut since = db.records_since(days_before(now, *days)?)?;
                    since.reverse();
                    since
                }
                None => db.list_records()?,
            };
            if let Some(limit) = limit {
                records.truncate(*limit);
            }
            eprintln!("{} records", records.len());
            print_records(&records, format)
        }
        FastCommand::Today { date } => {
            let day = match date {
                Some(date) => parse_day(date)?,
                None => now.date_naive(),
            };
            today(db, now, day, format)
        }
        FastCommand::Week => {
            let today = now.date_naive();
            let since = (today - Duration::days(6))
                .and_hms_opt(0, 0, 0)
                .map(|dt| dt.and_utc())
                .unwrap_or(now);
            let records = db.records_since(since)?;
            print_week(&week_bars(&records, today), format)
        }
        FastCommand::Delete { id } => {
            if !db.delete_record(*id)? {
                bail!("No fast record with id {}", id);
            }
            eprintln!("Deleted {}", id);
            Ok(())
        }
    }
}

/// Start of a `--days N` window ending at `now`.
fn days_before(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>> {
    if days < 0 {
        bail!("--days must not be negative, got {}", days);
    }
    Duration::try_days(days)
        .and_then(|span| now.checked_sub_signed(span))
        .ok_or_else(|| anyhow!("--days {} reaches past the earliest supported date", days))
}

fn start(
    db: &Db,
    now: DateTime<Utc>,
    fast_type: FastType,
    at: Option<&str>,
    notes: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    if let Some(current) = db.current_fast()? {
        bail!(
            "A fast is already in progress (started {}). Stop it first with `ifast fast stop`.",
            current.start_time.format("%Y-%m-%d %H:%M")
        );
    }
    let start_time = match at {
        Some(at) => parse_time(at)?,
        None => now,
    };
    let notes = match notes {
        Some(notes) => validation::validate_notes(notes)?,
        None => None,
    };
    let record = FastRecord::new(start_time, None, fast_type, notes);
    db.insert_record(&record)?;
    eprintln!(
        "Started a {} fast (target {}h)",
        fast_type,
        fast_type.target_hours()
    );
    print_records(&[record], format)
}

fn stop(
    db: &Db,
    now: DateTime<Utc>,
    at: Option<&str>,
    notes: Option<&str>,
    format: &OutputFormat,
) -> Result<()> {
    let Some(current) = db.current_fast()? else {
        bail!("No fast in progress. Start one with `ifast fast start`.");
    };
    let end = match at {
        Some(at) => parse_time(at)?,
        None => now,
    };
    if end < current.start_time {
        bail!("End time is before the fast started");
    }
    let notes = match notes {
        Some(notes) => Some(validation::validate_notes(notes)?.unwrap_or_default()),
        None => None,
    };
    let record = db.update_record(current.id, Some(end), notes.as_deref())?;
    eprintln!(
        "Fasted {} ({} of the {}h target)",
        format_duration(record.duration),
        format_percent(fast_progress(&record, end)),
        record.fast_type.target_hours()
    );
    print_records(&[record], format)
}

fn today(
    db: &Db,
    now: DateTime<Utc>,
    day: NaiveDate,
    format: &OutputFormat,
) -> Result<()> {
    let mut records = db.records_for_day(day)?;
    let current = db.current_fast()?;
    if let Some(current) = &current {
        if !records.iter().any(|r| r.id == current.id) {
            records.push(current.clone());
        }
    }
    let summary = DaySummary::compute(&records, now, day);

    if *format == OutputFormat::Json {
        print_json(&summary);
        return Ok(());
    }

    let mut rows = vec![
        field("Day", summary.day),
        field("Completed Fasts", summary.completed_fasts),
        field("Completed", format_duration(summary.completed_seconds)),
        field("Current Fast", format_duration(summary.current_seconds)),
        field("Fasting Goal", summary.progress_text()),
        field("Progress", format_percent(summary.progress)),
    ];
    if let Some(current) = &current {
        rows.push(field(
            "Current Fast Target",
            format!(
                "{} of {}h",
                format_percent(fast_progress(current, now)),
                current.fast_type.target_hours()
            ),
        ));
    }
    print_rows(rows, &summary, format)
}
