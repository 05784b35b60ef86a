use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use ifast_lib::progress::{format_duration, DayBar};
use ifast_lib::types::{FastRecord, FastingStatistics, UserResponse};
use ifast_lib::StepSummary;
use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
    Markdown,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            other => bail!(
                "unknown output format '{}' (expected table, json, csv or markdown)",
                other
            ),
        }
    }
}

#[derive(Tabled, Serialize)]
pub(crate) struct RecordRow {
    #[tabled(rename = "ID")]
    #[serde(rename = "ID")]
    id: String,
    #[tabled(rename = "Start")]
    #[serde(rename = "Start")]
    start: String,
    #[tabled(rename = "End")]
    #[serde(rename = "End")]
    end: String,
    #[tabled(rename = "Duration")]
    #[serde(rename = "Duration")]
    duration: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "Type")]
    fast_type: String,
    #[tabled(rename = "Notes")]
    #[serde(rename = "Notes")]
    notes: String,
}

#[derive(Tabled, Serialize)]
pub(crate) struct FieldRow {
    #[tabled(rename = "Field")]
    #[serde(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Tabled, Serialize)]
pub(crate) struct DayRow {
    #[tabled(rename = "Day")]
    #[serde(rename = "Day")]
    day: String,
    #[tabled(rename = "Fasted")]
    #[serde(rename = "Fasted")]
    fasted: String,
    #[tabled(rename = "Target")]
    #[serde(rename = "Target")]
    target: String,
    #[tabled(rename = "Progress")]
    #[serde(rename = "Progress")]
    progress: String,
}

#[derive(Tabled, Serialize)]
pub(crate) struct StepRow {
    #[tabled(rename = "Day")]
    #[serde(rename = "Day")]
    day: String,
    #[tabled(rename = "Steps")]
    #[serde(rename = "Steps")]
    steps: u32,
    #[tabled(rename = "Calories")]
    #[serde(rename = "Calories")]
    calories: u32,
    #[tabled(rename = "Miles")]
    #[serde(rename = "Miles")]
    miles: String,
    #[tabled(rename = "Goal")]
    #[serde(rename = "Goal")]
    goal: String,
}

// -- Row builders --

pub(crate) fn format_time(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

pub(crate) fn format_percent(ratio: f64) -> String {
    format!("{}%", (ratio * 100.0).round() as i64)
}

pub(crate) fn build_record_rows(records: &[FastRecord], now: DateTime<Utc>) -> Vec<RecordRow> {
    records
        .iter()
        .map(|r| RecordRow {
            id: r.id.to_string(),
            start: format_time(&r.start_time),
            end: r
                .end_time
                .as_ref()
                .map(format_time)
                .unwrap_or_else(|| "in progress".to_string()),
            duration: format_duration(r.elapsed_seconds(now)),
            fast_type: r.fast_type.to_string(),
            notes: r.notes.clone().unwrap_or_default(),
        })
        .collect()
}

pub(crate) fn field(name: &str, value: impl ToString) -> FieldRow {
    FieldRow {
        field: name.to_string(),
        value: value.to_string(),
    }
}

pub(crate) fn build_user_rows(user: &UserResponse) -> Vec<FieldRow> {
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();
    vec![
        field("ID", user.id.map(|id| id.to_string()).unwrap_or_default()),
        field("Username", opt(&user.username)),
        field("Name", user.display_name()),
        field("Email", opt(&user.email)),
        field(
            "Email Verified",
            user.email_verified.map(|v| v.to_string()).unwrap_or_default(),
        ),
        field(
            "Roles",
            user.roles.as_ref().map(|r| r.join(", ")).unwrap_or_default(),
        ),
        field(
            "Member Since",
            user.created_at.as_ref().map(format_time).unwrap_or_default(),
        ),
        field(
            "Last Login",
            user.last_login_at.as_ref().map(format_time).unwrap_or_default(),
        ),
    ]
}

pub(crate) fn build_statistics_rows(stats: &FastingStatistics) -> Vec<FieldRow> {
    vec![
        field("Total Fasts", stats.total_fasts),
        field("Total Hours", format!("{:.1}", stats.total_fasting_hours)),
        field(
            "Average Duration",
            format!("{:.1}h", stats.average_fasting_duration),
        ),
        field("Longest Fast", format!("{:.1}h", stats.longest_fast)),
        field("Current Streak", format!("{} days", stats.current_streak)),
    ]
}

pub(crate) fn build_day_rows(bars: &[DayBar]) -> Vec<DayRow> {
    bars.iter()
        .map(|b| DayRow {
            day: b.day.format("%a %Y-%m-%d").to_string(),
            fasted: format_duration(b.hours * 3600.0),
            target: format!("{}h", b.target_hours),
            progress: format_percent(b.ratio),
        })
        .collect()
}

pub(crate) fn build_step_rows(summaries: &[StepSummary]) -> Vec<StepRow> {
    summaries
        .iter()
        .map(|s| StepRow {
            day: s.day.to_string(),
            steps: s.steps,
            calories: s.calories,
            miles: format!("{:.2}", s.distance_miles),
            goal: format_percent(s.progress),
        })
        .collect()
}

// -- Output --

/// Prints `rows` in any tabular format; JSON prints `raw` instead so callers
/// keep full-fidelity values there.
pub fn print_rows<R, T>(rows: Vec<R>, raw: &T, format: &OutputFormat) -> Result<()>
where
    R: Tabled + Serialize,
    T: Serialize + ?Sized,
{
    match format {
        OutputFormat::Table => println!("{}", Table::new(rows)),
        OutputFormat::Markdown => {
            let mut table = Table::new(rows);
            table.with(Style::markdown());
            println!("{}", table);
        }
        OutputFormat::Csv => print_csv(rows)?,
        OutputFormat::Json => print_json(raw),
    }
    Ok(())
}

pub fn print_records(records: &[FastRecord], format: &OutputFormat) -> Result<()> {
    print_rows(build_record_rows(records, Utc::now()), records, format)
}

pub fn print_user(user: &UserResponse, format: &OutputFormat) -> Result<()> {
    print_rows(build_user_rows(user), user, format)
}

pub fn print_statistics(stats: &FastingStatistics, format: &OutputFormat) -> Result<()> {
    print_rows(build_statistics_rows(stats), stats, format)
}

pub fn print_week(bars: &[DayBar], format: &OutputFormat) -> Result<()> {
    print_rows(build_day_rows(bars), bars, format)
}

pub fn print_steps(summaries: &[StepSummary], format: &OutputFormat) -> Result<()> {
    print_rows(build_step_rows(summaries), summaries, format)
}

fn print_csv<R: Serialize>(rows: Vec<R>) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(std::io::stdout());
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_json<T: serde::Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize to JSON: {}", e),
    }
}
