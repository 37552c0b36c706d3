//! Due-time parsing and formatting.
//!
//! # Responsibility
//! - Accept the due-time shapes seen on the wire (epoch ms, RFC 3339, `""`).
//! - Parse user-entered due times (absolute or `+N[smhd]` relative).
//! - Render due times in local time for display.
//!
//! # Invariants
//! - Every accepted input is normalized to Unix epoch milliseconds.
//! - Empty input means "no due time", never an error.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::error::Error;
use std::fmt::{Display, Formatter};

static RELATIVE_DUE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\+(\d{1,9})\s*([smhd])$").expect("valid relative due regex"));
static EPOCH_MS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,16}$").expect("valid epoch ms regex"));

const LOCAL_INPUT_FORMATS: &[&str] = &["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Unparseable due-time input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueParseError {
    input: String,
}

impl Display for DueParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid due time `{}`; expected RFC 3339, `YYYY-MM-DD HH:MM`, epoch ms or `+N[smhd]`",
            self.input
        )
    }
}

impl Error for DueParseError {}

/// Parses a user-entered due time relative to `now_ms`.
///
/// Returns `Ok(None)` for empty input or the literal `none`.
pub fn parse_due_input(input: &str, now_ms: i64) -> Result<Option<i64>, DueParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let invalid = || DueParseError {
        input: trimmed.to_string(),
    };

    if let Some(captures) = RELATIVE_DUE_RE.captures(trimmed) {
        let amount: i64 = captures[1].parse().map_err(|_| invalid())?;
        let unit_ms: i64 = match &captures[2] {
            "s" => 1_000,
            "m" => 60_000,
            "h" => 3_600_000,
            _ => 86_400_000,
        };
        return amount
            .checked_mul(unit_ms)
            .and_then(|offset| now_ms.checked_add(offset))
            .map(Some)
            .ok_or_else(invalid);
    }

    if EPOCH_MS_RE.is_match(trimmed) {
        return trimmed.parse::<i64>().map(Some).map_err(|_| invalid());
    }

    parse_absolute(trimmed).map(Some).ok_or_else(invalid)
}

/// Formats epoch milliseconds as local `YYYY-MM-DD HH:MM`.
pub fn format_due(due_at_ms: i64) -> String {
    match DateTime::from_timestamp_millis(due_at_ms) {
        Some(utc) => utc.with_timezone(&Local).format(DISPLAY_FORMAT).to_string(),
        None => due_at_ms.to_string(),
    }
}

fn parse_absolute(value: &str) -> Option<i64> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.timestamp_millis());
    }
    LOCAL_INPUT_FORMATS.iter().find_map(|format| {
        let naive = NaiveDateTime::parse_from_str(value, format).ok()?;
        let local = Local.from_local_datetime(&naive).earliest()?;
        Some(local.timestamp_millis())
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDueAt {
    Millis(i64),
    Text(String),
}

fn raw_to_millis(raw: RawDueAt) -> Result<Option<i64>, String> {
    match raw {
        RawDueAt::Millis(value) => Ok(Some(value)),
        RawDueAt::Text(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            DateTime::parse_from_rfc3339(trimmed)
                .map(|parsed| Some(parsed.timestamp_millis()))
                .map_err(|err| {
                    format!("invalid dueAt `{trimmed}`: expected epoch milliseconds or RFC 3339 ({err})")
                })
        }
    }
}

/// Serde helper: `null`, absent and `""` all become `None`.
pub(crate) fn deserialize_due_at<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawDueAt>::deserialize(deserializer)? {
        Some(raw) => raw_to_millis(raw).map_err(D::Error::custom),
        None => Ok(None),
    }
}

/// Serde helper for sparse updates: a present key always yields `Some(..)`.
pub(crate) fn deserialize_due_patch<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    deserialize_due_at(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::{format_due, parse_due_input};
    use chrono::{Local, TimeZone};

    const NOW: i64 = 1_700_000_000_000;

    #[test]
    fn empty_and_none_mean_no_due_time() {
        assert_eq!(parse_due_input("", NOW), Ok(None));
        assert_eq!(parse_due_input("  ", NOW), Ok(None));
        assert_eq!(parse_due_input("None", NOW), Ok(None));
    }

    #[test]
    fn relative_offsets_are_added_to_now() {
        assert_eq!(parse_due_input("+30s", NOW), Ok(Some(NOW + 30_000)));
        assert_eq!(parse_due_input("+10m", NOW), Ok(Some(NOW + 600_000)));
        assert_eq!(parse_due_input("+2h", NOW), Ok(Some(NOW + 7_200_000)));
        assert_eq!(parse_due_input("+1d", NOW), Ok(Some(NOW + 86_400_000)));
    }

    #[test]
    fn rfc3339_and_epoch_inputs_are_absolute() {
        assert_eq!(
            parse_due_input("2023-11-14T22:13:20Z", 0),
            Ok(Some(1_700_000_000_000))
        );
        assert_eq!(parse_due_input("1700000000000", 0), Ok(Some(NOW)));
    }

    #[test]
    fn local_datetime_input_uses_local_timezone() {
        let expected = Local
            .with_ymd_and_hms(2030, 1, 2, 9, 30, 0)
            .earliest()
            .unwrap()
            .timestamp_millis();
        assert_eq!(parse_due_input("2030-01-02 09:30", 0), Ok(Some(expected)));
        assert_eq!(parse_due_input("2030-01-02T09:30", 0), Ok(Some(expected)));
        assert_eq!(format_due(expected), "2030-01-02 09:30");
    }

    #[test]
    fn garbage_is_rejected_with_input_echoed() {
        let err = parse_due_input("tomorrow-ish", NOW).unwrap_err();
        assert!(err.to_string().contains("tomorrow-ish"));
    }

    #[test]
    fn wire_due_at_accepts_rfc3339_strings() {
        let task: crate::model::task::NewTask =
            serde_json::from_str(r#"{"title":"x","dueAt":"2023-11-14T22:13:20.000Z"}"#).unwrap();
        assert_eq!(task.due_at, Some(NOW));

        let bad = serde_json::from_str::<crate::model::task::NewTask>(
            r#"{"title":"x","dueAt":"soon"}"#,
        );
        assert!(bad.is_err());
    }
}
