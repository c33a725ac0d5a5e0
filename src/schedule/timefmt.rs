//! Time and date normalization for schedule text.
//!
//! Contractors type times as `8`, `8AM`, `8:30 pm`, `14:00:00` or a window like
//! `8-10AM`, and dates as `5/5/2025`, `21-Apr` or `2025-05-05`. Both parsers
//! return an error value instead of guessing; the assembler decides what to
//! substitute.
//!
//! ## Force-PM rule
//!
//! Field crews rarely start before 6 in the morning, so a bare hour in the
//! [`ForcePmPolicy`] set (default 1–5) with no meridiem is read as PM. The
//! rule covers `H` and `H:MM` tokens only. `HH:MM:SS` values come from
//! spreadsheet exports and are already on a 24-hour clock.

use chrono::{Datelike, Days, NaiveDate, NaiveTime, Timelike};
use regex::Regex;
use std::collections::BTreeSet;
use std::sync::LazyLock;
use thiserror::Error;

use crate::config::defaults::FORCE_PM_HOURS;

static TIME_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})(?::(\d{2}))?(?::(\d{2}))?(?:\s*([ap])m?)?$").expect("valid time regex")
});

static US_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})/(\d{1,2})(?:/(\d{2}|\d{4}))?$").expect("valid date regex")
});

static ISO_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})(?:[ T]\d{1,2}:\d{2}(?::\d{2})?)?$")
        .expect("valid iso regex")
});

static DAY_MONTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{1,2})-([A-Za-z]{3,9})(?:-(\d{2}|\d{4}))?$").expect("valid day-month regex")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z]{3,9})\.?\s+(\d{1,2})(?:,?\s+(\d{4}))?$").expect("valid month-day regex")
});

/// Any `M/D/YYYY` inside a longer header such as `Monday 5/5/2025`.
static EMBEDDED_US_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}/\d{1,2}/(?:\d{4}|\d{2}))\b").expect("valid embedded date regex")
});

const WEEKDAYS: [&str; 7] = [
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable time '{0}'")]
pub struct TimeParseError(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparseable date '{0}'")]
pub struct DateParseError(pub String);

/// Hours that are read as PM when no meridiem is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForcePmPolicy {
    hours: BTreeSet<u32>,
}

impl ForcePmPolicy {
    pub fn new(hours: impl IntoIterator<Item = u32>) -> Self {
        Self {
            hours: hours.into_iter().collect(),
        }
    }

    /// No hour is forced; meridiem-less times are taken literally.
    pub fn disabled() -> Self {
        Self {
            hours: BTreeSet::new(),
        }
    }

    pub fn applies(&self, hour: u32) -> bool {
        self.hours.contains(&hour)
    }

    pub fn hours(&self) -> impl Iterator<Item = u32> + '_ {
        self.hours.iter().copied()
    }
}

impl Default for ForcePmPolicy {
    fn default() -> Self {
        Self::new(FORCE_PM_HOURS.iter().copied())
    }
}

/// Parse a time token with the default force-PM policy.
pub fn parse_time(raw: &str) -> Result<NaiveTime, TimeParseError> {
    parse_time_with(raw, &ForcePmPolicy::default())
}

/// Parse a time token. A window (`8-10AM`, `8:00 AM - 10:00 AM`) yields its
/// start; the start inherits the end's meridiem when it has none.
pub fn parse_time_with(raw: &str, policy: &ForcePmPolicy) -> Result<NaiveTime, TimeParseError> {
    let cleaned = clean_time(raw);
    if cleaned.is_empty() {
        return Err(TimeParseError(raw.to_string()));
    }

    if let Some((start, end)) = split_window(&cleaned) {
        let end_meridiem = TIME_TOKEN
            .captures(end)
            .and_then(|caps| caps.get(4).map(|m| m.as_str().to_string()));
        let start_time = match (end_meridiem.as_deref(), resolve(end, None, policy)) {
            // `10-12pm` starts at 10am, not 10pm: a start after the end flips to AM
            (Some(meridiem), Some(end_time)) => resolve(start, Some(meridiem), policy)
                .filter(|t| *t <= end_time)
                .or_else(|| resolve(start, Some("a"), policy)),
            _ => resolve(start, None, policy),
        };
        return start_time.ok_or_else(|| TimeParseError(raw.to_string()));
    }

    resolve(&cleaned, None, policy).ok_or_else(|| TimeParseError(raw.to_string()))
}

fn clean_time(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace('.', "");
    lowered.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_window(cleaned: &str) -> Option<(&str, &str)> {
    let (start, end) = cleaned
        .split_once('-')
        .or_else(|| cleaned.split_once(" to "))?;
    let (start, end) = (start.trim(), end.trim());
    if TIME_TOKEN.is_match(start) && TIME_TOKEN.is_match(end) {
        Some((start, end))
    } else {
        None
    }
}

fn resolve(
    token: &str,
    inherited_meridiem: Option<&str>,
    policy: &ForcePmPolicy,
) -> Option<NaiveTime> {
    let caps = TIME_TOKEN.captures(token)?;
    let hour: u32 = caps[1].parse().ok()?;
    let minute: u32 = caps.get(2).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let second: u32 = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok())?;
    let has_seconds = caps.get(3).is_some();
    let meridiem = caps.get(4).map(|m| m.as_str()).or(inherited_meridiem);

    let hour = match meridiem {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (m, hour) {
                ("a", 12) => 0,
                ("p", h) if h < 12 => h + 12,
                (_, h) => h,
            }
        }
        None if !has_seconds && policy.applies(hour) => hour + 12,
        None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, second)
}

/// Render a time the way the dispatch digest shows it: `8am`, `2:30pm`.
pub fn format_clock(time: NaiveTime) -> String {
    let (is_pm, hour12) = time.hour12();
    let suffix = if is_pm { "pm" } else { "am" };
    if time.minute() == 0 {
        format!("{hour12}{suffix}")
    } else {
        format!("{hour12}:{:02}{suffix}", time.minute())
    }
}

/// Parse a date token. Year-less forms take `today`'s year.
pub fn parse_date(raw: &str, today: NaiveDate) -> Result<NaiveDate, DateParseError> {
    let token = strip_weekday(raw.trim());
    let err = || DateParseError(raw.to_string());

    if let Some(caps) = ISO_DATE.captures(token) {
        let year: i32 = caps[1].parse().map_err(|_| err())?;
        let month: u32 = caps[2].parse().map_err(|_| err())?;
        let day: u32 = caps[3].parse().map_err(|_| err())?;
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err);
    }

    if let Some(caps) = US_DATE.captures(token) {
        let month: u32 = caps[1].parse().map_err(|_| err())?;
        let day: u32 = caps[2].parse().map_err(|_| err())?;
        let year = match caps.get(3) {
            Some(y) => expand_year(y.as_str()).ok_or_else(err)?,
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err);
    }

    if let Some(caps) = DAY_MONTH.captures(token) {
        let day: u32 = caps[1].parse().map_err(|_| err())?;
        let month = month_from_name(&caps[2]).ok_or_else(err)?;
        let year = match caps.get(3) {
            Some(y) => expand_year(y.as_str()).ok_or_else(err)?,
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err);
    }

    if let Some(caps) = MONTH_DAY.captures(token) {
        let month = month_from_name(&caps[1]).ok_or_else(err)?;
        let day: u32 = caps[2].parse().map_err(|_| err())?;
        let year = match caps.get(3) {
            Some(y) => y.as_str().parse().map_err(|_| err())?,
            None => today.year(),
        };
        return NaiveDate::from_ymd_opt(year, month, day).ok_or_else(err);
    }

    Err(err())
}

/// True when the whole token is a `D-Mon` date such as `21-Apr`.
pub fn is_day_month(token: &str) -> bool {
    DAY_MONTH
        .captures(token.trim())
        .is_some_and(|caps| month_from_name(&caps[2]).is_some())
}

/// Find an `M/D/YYYY` date inside a header line.
pub fn find_us_date(line: &str) -> Option<&str> {
    EMBEDDED_US_DATE.captures(line).and_then(|c| c.get(1)).map(|m| m.as_str())
}

/// True when the whole (trimmed) line is a date in any accepted form.
///
/// Year-less forms are checked against a leap year so `29-Feb` counts.
pub fn is_date_line(line: &str) -> bool {
    NaiveDate::from_ymd_opt(2024, 1, 1).is_some_and(|leap| parse_date(line, leap).is_ok())
}

/// True when the whole (trimmed) line is a time in any accepted form.
pub fn is_time_line(line: &str) -> bool {
    parse_time_with(line, &ForcePmPolicy::disabled()).is_ok()
}

/// The day after `today`, the fallback for records with no usable date.
pub fn tomorrow(today: NaiveDate) -> NaiveDate {
    today.checked_add_days(Days::new(1)).unwrap_or(today)
}

fn strip_weekday(token: &str) -> &str {
    let lower = token.to_lowercase();
    for day in WEEKDAYS {
        for prefix in [day, &day[..3]] {
            if lower.starts_with(prefix) {
                let Some(rest) = token.get(prefix.len()..) else {
                    continue;
                };
                let rest = rest.trim_start_matches([',', ' ', '\t']);
                if rest.starts_with(|c: char| c.is_ascii_digit()) {
                    return rest;
                }
            }
        }
    }
    token
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    Some(if raw.len() == 2 { 2000 + year } else { year })
}

fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
    ];
    let lower = name.to_lowercase();
    let prefix = lower.get(..3)?;
    MONTHS
        .iter()
        .position(|m| *m == prefix)
        .and_then(|i| u32::try_from(i + 1).ok())
}
