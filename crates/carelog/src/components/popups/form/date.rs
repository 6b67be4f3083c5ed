//! Calendar-date handling for date fields.
//!
//! All date values crossing the form boundary are plain `YYYY-MM-DD` strings.
//! Parsing special-cases that exact pattern and builds the `NaiveDate` from
//! explicit year/month/day components; handing the string to a general
//! datetime parser would reintroduce the timezone-shift off-by-one-day class
//! of bug this module exists to avoid.

use std::collections::HashMap;

use chrono::{Local, NaiveDate};
use tracing::error;

use super::value::FieldValue;

/// Strict `YYYY-MM-DD` parse. Returns `None` for anything else, including
/// otherwise-valid dates in other notations.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let b = s.as_bytes();
    if b.len() != 10 || b[4] != b'-' || b[7] != b'-' {
        return None;
    }
    let digits = |range: std::ops::Range<usize>| b[range].iter().all(u8::is_ascii_digit);
    if !digits(0..4) || !digits(5..7) || !digits(8..10) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[5..7].parse().ok()?;
    let day: u32 = s[8..10].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

pub fn format_iso_date(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Parse a stored date value, logging (once, at the call site that loads or
/// commits the value, not per frame) when a non-empty value is unusable.
pub fn parse_stored_date(field: &str, raw: &str) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    match parse_iso_date(raw) {
        Some(d) => Some(d),
        None => {
            error!(field, value = raw, "stored date is not a valid YYYY-MM-DD value");
            None
        }
    }
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// A statically configured date limit: a fixed day, or "today" resolved at
/// the moment the limit is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateBound {
    On(NaiveDate),
    Today,
}

impl DateBound {
    pub fn resolve(self) -> NaiveDate {
        match self {
            DateBound::On(d) => d,
            DateBound::Today => today(),
        }
    }
}

/// Candidate names of the "start" sibling for an end-date field.
///
/// `<prefix>_end_date` pairs with `<prefix>_start_date` or
/// `<prefix>_onset_date`; the literal `end_date` pairs with `start_date` or
/// `onset_date`. Any other name has no sibling.
pub fn start_sibling_candidates(name: &str) -> Vec<String> {
    if name == "end_date" {
        return vec!["start_date".to_string(), "onset_date".to_string()];
    }
    match name.strip_suffix("_end_date") {
        Some(prefix) if !prefix.is_empty() => vec![
            format!("{prefix}_start_date"),
            format!("{prefix}_onset_date"),
        ],
        _ => Vec::new(),
    }
}

/// Effective minimum for a date field: a present, parseable start-sibling
/// value overrides the statically configured minimum.
pub fn effective_min_date(
    name: &str,
    configured: Option<DateBound>,
    values: &HashMap<String, FieldValue>,
) -> Option<NaiveDate> {
    for sibling in start_sibling_candidates(name) {
        let parsed = values
            .get(&sibling)
            .and_then(FieldValue::as_text)
            .and_then(parse_iso_date);
        if let Some(d) = parsed {
            return Some(d);
        }
    }
    configured.map(DateBound::resolve)
}

pub fn effective_max_date(configured: Option<DateBound>) -> Option<NaiveDate> {
    configured.map(DateBound::resolve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_dates_round_trip_exactly() {
        for s in ["2024-01-10", "1999-12-31", "2020-02-29", "0001-01-01"] {
            let parsed = parse_iso_date(s).expect(s);
            assert_eq!(format_iso_date(parsed), s);
        }
    }

    #[test]
    fn invalid_dates_parse_to_none_without_panicking() {
        for s in [
            "",
            "2024-1-10",
            "2024/01/10",
            "01-10-2024",
            "2024-13-01",
            "2024-02-30",
            "2023-02-29",
            "yesterday",
            "2024-01-10T00:00:00Z",
        ] {
            assert_eq!(parse_iso_date(s), None, "expected None for {s:?}");
        }
    }

    #[test]
    fn end_date_pairs_with_start_and_onset() {
        assert_eq!(
            start_sibling_candidates("end_date"),
            vec!["start_date".to_string(), "onset_date".to_string()]
        );
        assert_eq!(
            start_sibling_candidates("coverage_end_date"),
            vec![
                "coverage_start_date".to_string(),
                "coverage_onset_date".to_string()
            ]
        );
        assert!(start_sibling_candidates("start_date").is_empty());
        assert!(start_sibling_candidates("_end_date").is_empty());
        assert!(start_sibling_candidates("birth_date").is_empty());
    }

    #[test]
    fn sibling_value_overrides_configured_minimum() {
        let mut values = HashMap::new();
        values.insert("onset_date".to_string(), FieldValue::text("2024-01-10"));
        values.insert("end_date".to_string(), FieldValue::empty());

        let configured = Some(DateBound::On(parse_iso_date("2000-01-01").unwrap()));
        let min = effective_min_date("end_date", configured, &values).unwrap();
        assert_eq!(format_iso_date(min), "2024-01-10");
    }

    #[test]
    fn configured_minimum_applies_when_sibling_is_absent_or_unparseable() {
        let configured = Some(DateBound::On(parse_iso_date("2000-01-01").unwrap()));

        let empty = HashMap::new();
        let min = effective_min_date("end_date", configured, &empty).unwrap();
        assert_eq!(format_iso_date(min), "2000-01-01");

        let mut garbled = HashMap::new();
        garbled.insert("start_date".to_string(), FieldValue::text("not-a-date"));
        let min = effective_min_date("end_date", configured, &garbled).unwrap();
        assert_eq!(format_iso_date(min), "2000-01-01");

        assert_eq!(effective_min_date("end_date", None, &empty), None);
    }
}
