//! CLI subcommand implementations.

pub mod auth;
pub mod debug_date;
pub mod fast;
pub mod remote;
pub mod steps;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use ifast_lib::ifast_api::dates::parse_flexible;
use ifast_lib::{Config, Db};

/// Parses a user-supplied timestamp in any format the API accepts.
pub(crate) fn parse_time(input: &str) -> Result<DateTime<Utc>> {
    parse_flexible(input).ok_or_else(|| {
        anyhow!(
            "invalid time '{}'. Expected e.g. 2024-01-15T20:00:00Z or 2024-01-15 20:00:00",
            input.trim()
        )
    })
}

/// Parses a YYYY-MM-DD day.
pub(crate) fn parse_day(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").map_err(|_| {
        anyhow!(
            "invalid date '{}'. Expected format: YYYY-MM-DD (e.g., 2024-06-01)",
            trimmed
        )
    })
}

pub(crate) fn open_db(config: &Config) -> Result<Db> {
    let db = Db::open(&config.db_path)
        .with_context(|| format!("opening {}", config.db_path.display()))?;
    db.init()?;
    Ok(db)
}
