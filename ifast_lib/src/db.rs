//! SQLite storage for locally logged fasting records.

use std::path::Path;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use ifast_api::types::{FastRecord, FastType};
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

/// Current `user_version` written by [`Db::init`].
pub const SCHEMA_VERSION: i32 = 1;

const RECORD_COLUMNS: &str = "id, start_time, end_time, duration, type, notes, created_at";

#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("date parse error: {0}")]
    Date(#[from] chrono::ParseError),
    #[error("invalid record id: {0}")]
    Id(#[from] uuid::Error),
    #[error("no fasting record with id {0}")]
    NotFound(Uuid),
}

pub struct Db {
    conn: Connection,
}

impl Db {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn init(&self) -> Result<(), DbError> {
        let version: i32 = self
            .conn
            .pragma_query_value(None, "user_version", |row| row.get(0))?;

        let schema = include_str!("../../schema/sqlite.sql");
        self.conn.execute_batch(schema)?;

        if version < SCHEMA_VERSION {
            self.conn
                .pragma_update(None, "user_version", SCHEMA_VERSION)?;
            tracing::debug!("Record store migrated from v{} to v{}", version, SCHEMA_VERSION);
        }
        Ok(())
    }

    pub fn insert_record(&self, record: &FastRecord) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO fast_records (id, start_time, end_time, duration, type, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                record.id.to_string(),
                to_sql_time(record.start_time),
                record.end_time.map(to_sql_time),
                record.duration,
                record.fast_type.display_name(),
                record.notes,
                to_sql_time(record.created_at),
            ],
        )?;
        Ok(())
    }

    /// Sets the end time and/or notes of a record. A new end time recomputes
    /// the duration from the stored start; `None` leaves a field as it is.
    /// Empty notes clear the stored notes.
    pub fn update_record(
        &self,
        id: Uuid,
        end_time: Option<DateTime<Utc>>,
        notes: Option<&str>,
    ) -> Result<FastRecord, DbError> {
        let mut record = self.get_record(id)?.ok_or(DbError::NotFound(id))?;
        if let Some(end) = end_time {
            record.finish(end);
        }
        if let Some(notes) = notes {
            let trimmed = notes.trim();
            record.notes = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }
        self.conn.execute(
            "UPDATE fast_records SET end_time = ?2, duration = ?3, notes = ?4 WHERE id = ?1",
            params![
                id.to_string(),
                record.end_time.map(to_sql_time),
                record.duration,
                record.notes,
            ],
        )?;
        Ok(record)
    }

    /// Overwrites the stored duration in seconds.
    pub fn set_duration(&self, id: Uuid, seconds: f64) -> Result<(), DbError> {
        let changed = self.conn.execute(
            "UPDATE fast_records SET duration = ?2 WHERE id = ?1",
            params![id.to_string(), seconds.max(0.0)],
        )?;
        if changed == 0 {
            return Err(DbError::NotFound(id));
        }
        Ok(())
    }

    pub fn get_record(&self, id: Uuid) -> Result<Option<FastRecord>, DbError> {
        let raw = self
            .conn
            .query_row(
                &format!("SELECT {} FROM fast_records WHERE id = ?1", RECORD_COLUMNS),
                params![id.to_string()],
                RawRecord::from_row,
            )
            .optional()?;
        raw.map(RawRecord::into_record).transpose()
    }

    /// All records, newest `created_at` first.
    pub fn list_records(&self) -> Result<Vec<FastRecord>, DbError> {
        self.query_records(
            &format!(
                "SELECT {} FROM fast_records ORDER BY created_at DESC",
                RECORD_COLUMNS
            ),
            &[],
        )
    }

    /// Returns whether a row was removed.
    pub fn delete_record(&self, id: Uuid) -> Result<bool, DbError> {
        let removed = self.conn.execute(
            "DELETE FROM fast_records WHERE id = ?1",
            params![id.to_string()],
        )?;
        Ok(removed > 0)
    }

    /// The most recently started record without an end time.
    pub fn current_fast(&self) -> Result<Option<FastRecord>, DbError> {
        let mut records = self.query_records(
            &format!(
                "SELECT {} FROM fast_records WHERE end_time IS NULL
                 ORDER BY start_time DESC LIMIT 1",
                RECORD_COLUMNS
            ),
            &[],
        )?;
        Ok(records.pop())
    }

    /// Records whose start time falls on `day` (UTC), earliest first.
    pub fn records_for_day(&self, day: NaiveDate) -> Result<Vec<FastRecord>, DbError> {
        let start = day.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        let end = day
            .succ_opt()
            .and_then(|next| next.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc());
        let (Some(start), Some(end)) = (start, end) else {
            return Ok(Vec::new());
        };
        self.query_records(
            &format!(
                "SELECT {} FROM fast_records WHERE start_time >= ?1 AND start_time < ?2
                 ORDER BY start_time ASC",
                RECORD_COLUMNS
            ),
            &[&to_sql_time(start), &to_sql_time(end)],
        )
    }

    /// Records started at or after `since`, earliest first.
    pub fn records_since(&self, since: DateTime<Utc>) -> Result<Vec<FastRecord>, DbError> {
        self.query_records(
            &format!(
                "SELECT {} FROM fast_records WHERE start_time >= ?1 ORDER BY start_time ASC",
                RECORD_COLUMNS
            ),
            &[&to_sql_time(since)],
        )
    }

    pub fn record_count(&self) -> Result<i64, DbError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(1) FROM fast_records", [], |row| row.get(0))?;
        Ok(count)
    }

    fn query_records(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::types::ToSql],
    ) -> Result<Vec<FastRecord>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, RawRecord::from_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?.into_record()?);
        }
        Ok(result)
    }
}

/// Fixed-width UTC timestamps so text comparison matches time order.
fn to_sql_time(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_sql_time(value: &str) -> Result<DateTime<Utc>, DbError> {
    Ok(DateTime::parse_from_rfc3339(value)?.with_timezone(&Utc))
}

/// Column values as stored, before id/date/type parsing.
struct RawRecord {
    id: String,
    start_time: String,
    end_time: Option<String>,
    duration: f64,
    fast_type: String,
    notes: Option<String>,
    created_at: String,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            start_time: row.get(1)?,
            end_time: row.get(2)?,
            duration: row.get(3)?,
            fast_type: row.get(4)?,
            notes: row.get(5)?,
            created_at: row.get(6)?,
        })
    }

    fn into_record(self) -> Result<FastRecord, DbError> {
        let fast_type = self.fast_type.parse().unwrap_or_else(|_| {
            tracing::warn!(
                "Unknown fast type '{}' on record {}, reading as {}",
                self.fast_type,
                self.id,
                FastType::default()
            );
            FastType::default()
        });
        Ok(FastRecord {
            id: Uuid::parse_str(&self.id)?,
            start_time: from_sql_time(&self.start_time)?,
            end_time: self.end_time.as_deref().map(from_sql_time).transpose()?,
            duration: self.duration,
            fast_type,
            notes: self.notes,
            created_at: from_sql_time(&self.created_at)?,
        })
    }
}
