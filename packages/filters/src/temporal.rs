//! Date and timestamp parameters.
//!
//! Accepted inputs are a bare date (`2025-10-01`) or a timestamp with a `T`
//! or space separator, optional seconds and fraction, and an optional
//! offset (`Z`, `+03:00`, `-0300`). Naive values are interpreted in the
//! service time zone.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::FilterError;

const LIST_DATE_REASON: &str =
    "Formato inválido. Use ISO-8601 (YYYY-MM-DD ou YYYY-MM-DDThh:mm:ss).";
const REPORT_DATE_REASON: &str = "Formato inválido. Use YYYY-MM-DD ou YYYY-MM-DDThh:mm:ss.";
const REPORT_RANGE_REASON: &str = "data_inicio não pode ser maior que data_fim.";

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%z",
    "%Y-%m-%dT%H:%M%z",
];

/// A successfully parsed date or timestamp parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedInstant {
    /// Date only.
    Date(NaiveDate),
    /// Timestamp without an offset.
    Naive(NaiveDateTime),
    /// Timestamp with an explicit offset.
    Aware(DateTime<FixedOffset>),
}

impl ParsedInstant {
    /// The calendar date as written, ignoring any time or offset.
    #[must_use]
    pub fn date(&self) -> NaiveDate {
        match self {
            Self::Date(date) => *date,
            Self::Naive(naive) => naive.date(),
            Self::Aware(aware) => aware.date_naive(),
        }
    }
}

/// Parses a `±HH:MM` (or `±HHMM`, or `Z`) offset string.
#[must_use]
pub fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0);
    }
    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

/// Parses a date or timestamp parameter. Full timestamps are tried first.
#[must_use]
pub fn parse_instant(raw: &str) -> Option<ParsedInstant> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if raw.len() > 10 {
        let mut normalized = raw.to_string();
        if normalized.as_bytes()[10] == b' ' {
            normalized.replace_range(10..11, "T");
        }
        if normalized.ends_with(['Z', 'z']) {
            normalized.pop();
            normalized.push_str("+00:00");
        }

        for format in OFFSET_FORMATS {
            if let Ok(aware) = DateTime::parse_from_str(&normalized, format) {
                return Some(ParsedInstant::Aware(aware));
            }
        }
        for format in NAIVE_FORMATS {
            if let Ok(naive) = NaiveDateTime::parse_from_str(&normalized, format) {
                return Some(ParsedInstant::Naive(naive));
            }
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(ParsedInstant::Date)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

fn localize(naive: NaiveDateTime, tz: FixedOffset) -> Option<DateTime<Utc>> {
    naive
        .and_local_timezone(tz)
        .single()
        .map(|local| local.with_timezone(&Utc))
}

/// Start (or end, with `is_end`) of `date` in `tz`.
#[must_use]
pub fn day_boundary(date: NaiveDate, is_end: bool, tz: FixedOffset) -> Option<DateTime<Utc>> {
    let time = if is_end { end_of_day() } else { NaiveTime::MIN };
    localize(date.and_time(time), tz)
}

/// Heatmap `start_date`/`end_date`.
///
/// Only the date portion of each value is used; the bounds are the start
/// of the start date and the end of the end date in `tz`. Unparseable or
/// empty values produce no bound.
#[must_use]
pub fn heatmap_date_bounds(
    start: Option<&str>,
    end: Option<&str>,
    tz: FixedOffset,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let bound = |raw: Option<&str>, is_end: bool| {
        let raw = raw?;
        let Some(parsed) = parse_instant(raw) else {
            log::debug!("Ignoring unparseable heatmap date {raw:?}");
            return None;
        };
        day_boundary(parsed.date(), is_end, tz)
    };
    (bound(start, false), bound(end, true))
}

/// List `created_from`/`created_to`.
///
/// A timestamp is honored at full precision (naive ones are taken in
/// `tz`); a bare date becomes the start or end of that day.
///
/// # Errors
///
/// * [`FilterError::InvalidParameter`] naming `param` if `raw` is not a
///   date or timestamp
pub fn list_date_bound(
    raw: &str,
    param: &str,
    is_end: bool,
    tz: FixedOffset,
) -> Result<DateTime<Utc>, FilterError> {
    let bound = match parse_instant(raw) {
        Some(ParsedInstant::Aware(aware)) => Some(aware.with_timezone(&Utc)),
        Some(ParsedInstant::Naive(naive)) => localize(naive, tz),
        Some(ParsedInstant::Date(date)) => day_boundary(date, is_end, tz),
        None => None,
    };
    bound.ok_or_else(|| FilterError::invalid(param, LIST_DATE_REASON))
}

/// Report `data_inicio`/`data_fim`.
///
/// Both bounds always collapse to day boundaries in `tz`. Empty values are
/// treated as absent.
///
/// # Errors
///
/// * [`FilterError::InvalidParameter`] naming the parameter if a value is
///   not a date or timestamp
/// * [`FilterError::InvalidRange`] if both parse and the start is after
///   the end
pub fn report_date_bounds(
    data_inicio: Option<&str>,
    data_fim: Option<&str>,
    tz: FixedOffset,
) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), FilterError> {
    let bound = |raw: Option<&str>, param: &str, is_end: bool| {
        let Some(raw) = raw.filter(|r| !r.is_empty()) else {
            return Ok(None);
        };
        parse_instant(raw)
            .and_then(|parsed| day_boundary(parsed.date(), is_end, tz))
            .map(Some)
            .ok_or_else(|| FilterError::invalid(param, REPORT_DATE_REASON))
    };

    let start = bound(data_inicio, "data_inicio", false)?;
    let end = bound(data_fim, "data_fim", true)?;

    if let (Some(start), Some(end)) = (start, end)
        && start > end
    {
        return Err(FilterError::InvalidRange {
            reason: REPORT_RANGE_REASON.to_string(),
        });
    }

    Ok((start, end))
}
