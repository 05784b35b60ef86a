//! Daily step counts and the estimates derived from them.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::IfastError;

/// Daily step goal.
pub const STEP_GOAL: u32 = 10_000;

const CALORIES_PER_STEP: f64 = 0.04;
const MILES_PER_STEP: f64 = 0.0005;

/// Read-only source of daily step totals.
pub trait StepCountProvider {
    /// Step totals for every day in `start..=end` the provider knows about.
    fn daily_steps(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, u32>, IfastError>;

    /// Steps for one day, zero when unknown.
    fn steps_for_day(&self, day: NaiveDate) -> Result<u32, IfastError> {
        Ok(self
            .daily_steps(day, day)?
            .get(&day)
            .copied()
            .unwrap_or(0))
    }
}

/// Step counts held in memory, optionally loaded from a JSON file of the form
/// `[{"date": "2024-01-15", "steps": 8421}, ...]`.
#[derive(Clone, Debug, Default)]
pub struct StaticStepProvider {
    days: BTreeMap<NaiveDate, u32>,
}

#[derive(Deserialize)]
struct StepEntry {
    date: NaiveDate,
    steps: u32,
}

impl StaticStepProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_day(mut self, day: NaiveDate, steps: u32) -> Self {
        self.days.insert(day, steps);
        self
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, IfastError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            IfastError::InvalidInput(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&contents)
    }

    /// Later entries for the same date replace earlier ones.
    pub fn from_json_str(contents: &str) -> Result<Self, IfastError> {
        let entries: Vec<StepEntry> = serde_json::from_str(contents)
            .map_err(|e| IfastError::InvalidInput(format!("invalid step data: {}", e)))?;
        Ok(Self {
            days: entries.into_iter().map(|e| (e.date, e.steps)).collect(),
        })
    }
}

impl StepCountProvider for StaticStepProvider {
    fn daily_steps(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, u32>, IfastError> {
        if end < start {
            return Ok(BTreeMap::new());
        }
        Ok(self
            .days
            .range(start..=end)
            .map(|(day, steps)| (*day, *steps))
            .collect())
    }
}

/// Rough calorie estimate, truncated to whole calories.
pub fn calories_from_steps(steps: u32) -> u32 {
    (f64::from(steps) * CALORIES_PER_STEP) as u32
}

pub fn distance_miles_from_steps(steps: u32) -> f64 {
    f64::from(steps) * MILES_PER_STEP
}

/// Share of [`STEP_GOAL`] reached, capped at 1.0.
pub fn step_progress(steps: u32) -> f64 {
    (f64::from(steps) / f64::from(STEP_GOAL)).min(1.0)
}

/// One day's steps with the derived estimates.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StepSummary {
    pub day: NaiveDate,
    pub steps: u32,
    pub calories: u32,
    pub distance_miles: f64,
    pub progress: f64,
}

impl StepSummary {
    pub fn new(day: NaiveDate, steps: u32) -> Self {
        Self {
            day,
            steps,
            calories: calories_from_steps(steps),
            distance_miles: distance_miles_from_steps(steps),
            progress: step_progress(steps),
        }
    }
}

/// Summaries for every day in `start..=end`, filling unknown days with zero.
pub fn summarize_range(
    provider: &dyn StepCountProvider,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<StepSummary>, IfastError> {
    let known = provider.daily_steps(start, end)?;
    Ok(start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| StepSummary::new(day, known.get(&day).copied().unwrap_or(0)))
        .collect())
}
