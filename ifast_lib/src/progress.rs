//! Daily fasting totals and progress ratios.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use ifast_api::types::{FastRecord, FastType};
use serde::Serialize;

/// Hours of fasting the daily goal asks for.
pub const DAILY_TARGET_HOURS: f64 = 16.0;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// Fasting done on one UTC day.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DaySummary {
    pub day: NaiveDate,
    /// Completed fasts that started on `day`.
    pub completed_fasts: usize,
    /// Summed durations of those completed fasts, in seconds.
    pub completed_seconds: f64,
    /// Elapsed seconds of the open fast, when it started on `day`.
    pub current_seconds: f64,
    /// Share of [`DAILY_TARGET_HOURS`] reached, in `0.0..=1.0`.
    pub progress: f64,
}

impl DaySummary {
    /// Totals `records` for `day`. Only the most recently started open
    /// record counts as the current fast.
    pub fn compute(records: &[FastRecord], now: DateTime<Utc>, day: NaiveDate) -> Self {
        let (completed_fasts, completed_seconds) = records
            .iter()
            .filter(|r| !r.is_open() && r.start_time.date_naive() == day)
            .fold((0, 0.0), |(count, secs), r| (count + 1, secs + r.duration));

        let current_seconds = records
            .iter()
            .filter(|r| r.is_open())
            .max_by_key(|r| r.start_time)
            .filter(|r| r.start_time.date_naive() == day)
            .map(|r| r.elapsed_seconds(now))
            .unwrap_or(0.0);

        let total = completed_seconds + current_seconds;
        Self {
            day,
            completed_fasts,
            completed_seconds,
            current_seconds,
            progress: ratio(total, DAILY_TARGET_HOURS * SECONDS_PER_HOUR),
        }
    }

    pub fn total_seconds(&self) -> f64 {
        self.completed_seconds + self.current_seconds
    }

    /// e.g. `"9h 30m / 16h"`
    pub fn progress_text(&self) -> String {
        format!(
            "{} / {}h",
            format_duration(self.total_seconds()),
            DAILY_TARGET_HOURS
        )
    }
}

/// Whole hours and minutes, e.g. `"16h 5m"`.
pub fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    format!("{}h {}m", total / 3600, total % 3600 / 60)
}

/// How far `record` is toward its type's target, in `0.0..=1.0`.
pub fn fast_progress(record: &FastRecord, now: DateTime<Utc>) -> f64 {
    let target = f64::from(record.fast_type.target_hours()) * SECONDS_PER_HOUR;
    ratio(record.elapsed_seconds(now), target)
}

/// Target hours of the most common fast type in `records`, 16 when empty.
/// Ties go to the type listed first in [`FastType::ALL`].
pub fn day_target_hours(records: &[FastRecord]) -> f64 {
    let mut best: Option<(FastType, usize)> = None;
    for fast_type in FastType::ALL {
        let count = records.iter().filter(|r| r.fast_type == fast_type).count();
        if count > 0 && best.map_or(true, |(_, n)| count > n) {
            best = Some((fast_type, count));
        }
    }
    best.map(|(t, _)| f64::from(t.target_hours()))
        .unwrap_or(DAILY_TARGET_HOURS)
}

/// One day in a weekly overview.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DayBar {
    pub day: NaiveDate,
    pub hours: f64,
    pub target_hours: f64,
    pub ratio: f64,
}

/// The seven days ending at `today`, oldest first. Each day sums the stored
/// durations of the records that started on it against that day's target.
pub fn week_bars(records: &[FastRecord], today: NaiveDate) -> Vec<DayBar> {
    (0..7)
        .rev()
        .map(|offset| {
            let day = today - Duration::days(offset);
            let on_day: Vec<FastRecord> = records
                .iter()
                .filter(|r| r.start_time.date_naive() == day)
                .cloned()
                .collect();
            let hours = on_day.iter().map(|r| r.duration).sum::<f64>() / SECONDS_PER_HOUR;
            let target_hours = day_target_hours(&on_day);
            DayBar {
                day,
                hours,
                target_hours,
                ratio: ratio(hours, target_hours),
            }
        })
        .collect()
}

fn ratio(value: f64, target: f64) -> f64 {
    if target <= 0.0 {
        return 0.0;
    }
    (value / target).clamp(0.0, 1.0)
}
