//! Tolerant timestamp decoding for API payloads.
//!
//! The backend has been seen emitting several different timestamp shapes, so
//! every date field in a response is tried against an ordered list of
//! candidate formats and the first match wins. Formats without an offset are
//! read as UTC.
//!
//! Outgoing timestamps are always written as RFC 3339 UTC with second
//! precision (`2024-01-15T10:30:00Z`).

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// A candidate timestamp format, in decoding priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateFormat {
    /// `2024-01-15T10:30:00.000+0000`
    ///
    /// The fraction must be exactly three digits. Microsecond or nanosecond
    /// fractions (`10:30:00.123456Z`) match no candidate and fail to decode.
    IsoMillis,
    /// `2024-01-15T10:30:00+0000`
    IsoSeconds,
    /// `2024-01-15T10:30:00`
    IsoLocal,
    /// `2024-01-15`
    DateOnly,
    /// `2024-01-15 10:30:00`
    SqlDateTime,
    /// `1705314600`
    UnixEpoch,
    /// `01/15/2024 10:30:00`
    UsSlash,
}

impl DateFormat {
    /// All candidates, in the order they are tried.
    pub const ALL: [DateFormat; 7] = [
        DateFormat::IsoMillis,
        DateFormat::IsoSeconds,
        DateFormat::IsoLocal,
        DateFormat::DateOnly,
        DateFormat::SqlDateTime,
        DateFormat::UnixEpoch,
        DateFormat::UsSlash,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DateFormat::IsoMillis => "ISO 8601 with milliseconds",
            DateFormat::IsoSeconds => "ISO 8601 with seconds",
            DateFormat::IsoLocal => "ISO 8601 without offset",
            DateFormat::DateOnly => "date only",
            DateFormat::SqlDateTime => "SQL datetime",
            DateFormat::UnixEpoch => "Unix epoch seconds",
            DateFormat::UsSlash => "US date",
        }
    }

    /// Parses `input` with this format only.
    pub fn parse(&self, input: &str) -> Option<DateTime<Utc>> {
        match self {
            DateFormat::IsoMillis => {
                if !has_millis(input) {
                    return None;
                }
                parse_with_offset(input, "%Y-%m-%dT%H:%M:%S%.f%z")
            }
            DateFormat::IsoSeconds => {
                if input.contains('.') {
                    return None;
                }
                parse_with_offset(input, "%Y-%m-%dT%H:%M:%S%z")
            }
            DateFormat::IsoLocal => NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc()),
            DateFormat::DateOnly => NaiveDate::parse_from_str(input, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            DateFormat::SqlDateTime => NaiveDateTime::parse_from_str(input, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc()),
            DateFormat::UnixEpoch => parse_epoch(input),
            DateFormat::UsSlash => NaiveDateTime::parse_from_str(input, "%m/%d/%Y %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc()),
        }
    }
}

impl std::fmt::Display for DateFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Parses `input` against every candidate format, first match wins.
pub fn parse_flexible(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    DateFormat::ALL.iter().find_map(|format| format.parse(input))
}

/// Reports how each candidate format handles `input`.
pub fn probe(input: &str) -> Vec<(DateFormat, Option<DateTime<Utc>>)> {
    let input = input.trim();
    DateFormat::ALL
        .iter()
        .map(|format| (*format, format.parse(input)))
        .collect()
}

/// Formats a timestamp the way the API expects to receive it.
pub fn format_utc(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn has_millis(input: &str) -> bool {
    match input.split_once('.') {
        Some((_, rest)) => {
            let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            digits == 3
        }
        None => false,
    }
}

fn parse_with_offset(input: &str, format: &str) -> Option<DateTime<Utc>> {
    let normalized = match input.strip_suffix('Z') {
        Some(head) => format!("{}+0000", head),
        None => input.to_string(),
    };
    DateTime::parse_from_str(&normalized, format)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_epoch(input: &str) -> Option<DateTime<Utc>> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit() || c == '.' || c == '-') {
        return None;
    }
    if let Ok(secs) = input.parse::<i64>() {
        return DateTime::from_timestamp(secs, 0);
    }
    let secs = input.parse::<f64>().ok().filter(|s| s.is_finite())?;
    DateTime::from_timestamp_millis((secs * 1000.0).round() as i64)
}

/// Serde adapter for `DateTime<Utc>` fields using [`parse_flexible`].
pub mod flexible {
    use chrono::{DateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(dt: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::format_utc(dt))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_flexible(&raw).ok_or_else(|| {
            de::Error::custom(format!(
                "date string '{}' does not match any expected format",
                raw
            ))
        })
    }

    /// Same as the parent module, for `Option<DateTime<Utc>>` fields.
    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            dt: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match dt {
                Some(dt) => serializer.serialize_some(&super::super::format_utc(dt)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => super::super::parse_flexible(&raw).map(Some).ok_or_else(|| {
                    de::Error::custom(format!(
                        "date string '{}' does not match any expected format",
                        raw
                    ))
                }),
                None => Ok(None),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn millis_and_seconds_forms_agree() {
        let millis = parse_flexible("2024-01-15T10:30:00.000+0000").unwrap();
        let seconds = parse_flexible("2024-01-15T10:30:00+0000").unwrap();
        assert_eq!(millis, seconds);
        assert_eq!(millis, utc(2024, 1, 15, 10, 30, 0));
    }

    #[test]
    fn millis_form_matches_first_candidate_only() {
        let input = "2024-01-15T10:30:00.000+0000";
        assert!(DateFormat::IsoMillis.parse(input).is_some());
        assert!(DateFormat::IsoSeconds.parse(input).is_none());

        let input = "2024-01-15T10:30:00+0000";
        assert!(DateFormat::IsoMillis.parse(input).is_none());
        assert!(DateFormat::IsoSeconds.parse(input).is_some());
    }

    #[test]
    fn only_three_digit_fractions_decode() {
        assert!(parse_flexible("2024-01-15T10:30:00.123Z").is_some());
        assert!(parse_flexible("2024-01-15T10:30:00.123456Z").is_none());
        assert!(parse_flexible("2024-01-15T10:30:00.5Z").is_none());
    }

    #[test]
    fn epoch_seconds() {
        assert_eq!(
            parse_flexible("1705314600").unwrap(),
            utc(2024, 1, 15, 10, 30, 0)
        );
        assert_eq!(
            parse_flexible("1705315800").unwrap(),
            utc(2024, 1, 15, 10, 50, 0)
        );
    }

    #[test]
    fn fractional_epoch_seconds() {
        let dt = parse_flexible("1705314600.5").unwrap();
        assert_eq!(dt.timestamp_millis(), 1_705_314_600_500);
    }

    #[test]
    fn zulu_and_colon_offsets() {
        let expected = utc(2024, 1, 15, 10, 30, 0);
        assert_eq!(parse_flexible("2024-01-15T10:30:00Z").unwrap(), expected);
        assert_eq!(parse_flexible("2024-01-15T10:30:00.000Z").unwrap(), expected);
        assert_eq!(parse_flexible("2024-01-15T12:30:00+02:00").unwrap(), expected);
    }

    #[test]
    fn offsetless_forms_read_as_utc() {
        let expected = utc(2024, 1, 15, 10, 30, 0);
        assert_eq!(parse_flexible("2024-01-15T10:30:00").unwrap(), expected);
        assert_eq!(parse_flexible("2024-01-15 10:30:00").unwrap(), expected);
        assert_eq!(parse_flexible("01/15/2024 10:30:00").unwrap(), expected);
        assert_eq!(parse_flexible("2024-01-15").unwrap(), utc(2024, 1, 15, 0, 0, 0));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_flexible("").is_none());
        assert!(parse_flexible("yesterday").is_none());
        assert!(parse_flexible("2024-13-45").is_none());
        assert!(parse_flexible("15.01.2024").is_none());
    }

    #[test]
    fn probe_reports_every_candidate() {
        let report = probe("2024-01-15");
        assert_eq!(report.len(), DateFormat::ALL.len());
        let matched: Vec<_> = report
            .iter()
            .filter(|(_, result)| result.is_some())
            .map(|(format, _)| *format)
            .collect();
        assert_eq!(matched, vec![DateFormat::DateOnly]);
    }

    #[test]
    fn serde_adapter_round_trips_through_rfc3339() {
        #[derive(serde::Serialize, serde::Deserialize)]
        struct Payload {
            #[serde(with = "flexible")]
            at: DateTime<Utc>,
            #[serde(default, with = "flexible::option")]
            maybe: Option<DateTime<Utc>>,
        }

        let payload: Payload =
            serde_json::from_str(r#"{"at": "2024-01-15 10:30:00", "maybe": null}"#).unwrap();
        assert_eq!(payload.at, utc(2024, 1, 15, 10, 30, 0));
        assert!(payload.maybe.is_none());

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["at"], "2024-01-15T10:30:00Z");

        let missing: Payload = serde_json::from_str(r#"{"at": "1705314600"}"#).unwrap();
        assert!(missing.maybe.is_none());

        let bad = serde_json::from_str::<Payload>(r#"{"at": "not a date"}"#);
        assert!(bad.is_err());
    }
}
