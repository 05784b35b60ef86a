use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::flexible;

/// Fasting schedule, serialized by its display name.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FastType {
    #[default]
    #[serde(rename = "16:8")]
    SixteenEight,
    #[serde(rename = "14:10")]
    FourteenTen,
    #[serde(rename = "18:6")]
    EighteenSix,
    #[serde(rename = "24:0")]
    TwentyFour,
    #[serde(rename = "Custom")]
    Custom,
}

impl FastType {
    pub const ALL: [FastType; 5] = [
        FastType::SixteenEight,
        FastType::FourteenTen,
        FastType::EighteenSix,
        FastType::TwentyFour,
        FastType::Custom,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            FastType::SixteenEight => "16:8",
            FastType::FourteenTen => "14:10",
            FastType::EighteenSix => "18:6",
            FastType::TwentyFour => "24:0",
            FastType::Custom => "Custom",
        }
    }

    /// Fasting window length in hours. Custom fasts use the 16h default.
    pub fn target_hours(&self) -> u32 {
        match self {
            FastType::SixteenEight => 16,
            FastType::FourteenTen => 14,
            FastType::EighteenSix => 18,
            FastType::TwentyFour => 24,
            FastType::Custom => 16,
        }
    }
}

impl std::fmt::Display for FastType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for FastType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        FastType::ALL
            .into_iter()
            .find(|t| t.display_name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| {
                format!(
                    "unknown fast type '{}' (expected one of 16:8, 14:10, 18:6, 24:0, Custom)",
                    s
                )
            })
    }
}

/// One intermittent-fasting session.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FastRecord {
    pub id: Uuid,
    #[serde(with = "flexible")]
    pub start_time: DateTime<Utc>,
    #[serde(default, with = "flexible::option")]
    pub end_time: Option<DateTime<Utc>>,
    /// Length of the fast in seconds. Zero while the fast is open.
    pub duration: f64,
    #[serde(rename = "type")]
    pub fast_type: FastType,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(with = "flexible")]
    pub created_at: DateTime<Utc>,
}

impl FastRecord {
    /// Creates a new record with a fresh id, created now.
    pub fn new(
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
        fast_type: FastType,
        notes: Option<String>,
    ) -> Self {
        let duration = end_time
            .map(|end| seconds_between(start_time, end))
            .unwrap_or(0.0);
        Self {
            id: Uuid::new_v4(),
            start_time,
            end_time,
            duration,
            fast_type,
            notes,
            created_at: Utc::now(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Closes the fast at `end`, recomputing the duration from the start time.
    pub fn finish(&mut self, end: DateTime<Utc>) {
        self.end_time = Some(end);
        self.duration = seconds_between(self.start_time, end);
    }

    /// Seconds fasted so far: the stored duration once closed, time since
    /// start while open.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> f64 {
        match self.end_time {
            Some(_) => self.duration,
            None => seconds_between(self.start_time, now),
        }
    }
}

/// Seconds from `start` to `end`, never negative.
fn seconds_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    let millis = (end - start).num_milliseconds().max(0);
    millis as f64 / 1000.0
}

/// Aggregate numbers from `/api/fasting/statistics`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FastingStatistics {
    pub total_fasting_hours: f64,
    pub average_fasting_duration: f64,
    pub longest_fast: f64,
    pub current_streak: i64,
    pub total_fasts: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn fast_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&FastType::SixteenEight).unwrap(),
            "\"16:8\""
        );
        let t: FastType = serde_json::from_str("\"Custom\"").unwrap();
        assert_eq!(t, FastType::Custom);
        assert!(serde_json::from_str::<FastType>("\"12:12\"").is_err());
    }

    #[test]
    fn fast_type_from_str() {
        assert_eq!("18:6".parse::<FastType>().unwrap(), FastType::EighteenSix);
        assert_eq!(" custom ".parse::<FastType>().unwrap(), FastType::Custom);
        assert!("weekly".parse::<FastType>().is_err());
    }

    #[test]
    fn target_hours() {
        assert_eq!(FastType::FourteenTen.target_hours(), 14);
        assert_eq!(FastType::TwentyFour.target_hours(), 24);
        assert_eq!(FastType::Custom.target_hours(), 16);
    }

    #[test]
    fn new_record_duration() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        let open = FastRecord::new(start, None, FastType::SixteenEight, None);
        assert!(open.is_open());
        assert_eq!(open.duration, 0.0);

        let closed = FastRecord::new(
            start,
            Some(start + Duration::hours(16)),
            FastType::SixteenEight,
            None,
        );
        assert_eq!(closed.duration, 16.0 * 3600.0);
    }

    #[test]
    fn finish_and_elapsed() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        let mut rec = FastRecord::new(start, None, FastType::EighteenSix, None);
        assert_eq!(rec.elapsed_seconds(start + Duration::minutes(90)), 5400.0);

        rec.finish(start + Duration::hours(2));
        assert!(!rec.is_open());
        assert_eq!(rec.duration, 7200.0);
        assert_eq!(rec.elapsed_seconds(start + Duration::hours(10)), 7200.0);
    }

    #[test]
    fn end_before_start_clamps_to_zero() {
        let start = Utc.with_ymd_and_hms(2024, 1, 15, 20, 0, 0).unwrap();
        let rec = FastRecord::new(
            start,
            Some(start - Duration::hours(1)),
            FastType::SixteenEight,
            None,
        );
        assert_eq!(rec.duration, 0.0);
    }

    #[test]
    fn record_decodes_mixed_date_formats() {
        let json = r#"{
            "id": "6f1c2b8e-3c1d-4f5a-9a53-0a3d1c6e7b90",
            "startTime": "2024-01-15 20:00:00",
            "endTime": "2024-01-16T12:00:00.000+0000",
            "duration": 57600,
            "type": "16:8",
            "notes": null,
            "createdAt": "1705348800"
        }"#;
        let rec: FastRecord = serde_json::from_str(json).unwrap();
        assert_eq!(rec.fast_type, FastType::SixteenEight);
        assert_eq!(rec.duration, 57600.0);
        assert_eq!(
            rec.end_time.unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 16, 12, 0, 0).unwrap()
        );
        assert_eq!(rec.created_at.timestamp(), 1_705_348_800);
    }
}
