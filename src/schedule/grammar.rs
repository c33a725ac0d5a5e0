//! Field splitting and line classification shared by the dialect parsers.

use regex::Regex;
use std::sync::LazyLock;

use super::types::WorkOrderId;

/// Tab or a run of two or more spaces, the column gap of copied spreadsheets.
static COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t|\s{2,}").expect("valid column gap regex"));

/// Spaced dash or en dash between fields. Hyphenated names stay whole.
static SPACED_DASH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+[-–]\s+").expect("valid dash regex"));

/// Leading time followed by a field gap, as in `8:00 AM - Smith - ...`.
static LEADING_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(\d{1,2}(?::\d{2})?\s*(?:[ap]\.?m\.?)?)(?:\t|\s+[-–]\s+|\s{2,})(.+)$")
        .expect("valid leading time regex")
});

/// Split a line on tabs, trimming cells and keeping empty ones in place.
pub fn tab_cells(line: &str) -> Vec<&str> {
    line.split('\t').map(str::trim).collect()
}

/// Split on tab or 2+ spaces, dropping empty cells.
pub fn column_cells(line: &str) -> Vec<&str> {
    COLUMN_GAP
        .split(line.trim())
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

/// Field delimiter of an inline job line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// ` - ` with any surrounding whitespace
    Dash,
    /// `_`
    Underscore,
    /// Tab, spaced dash or 2+ spaces, whichever the line uses
    Any,
}

impl Delimiter {
    pub fn split(self, line: &str) -> Vec<&str> {
        let trimmed = line.trim();
        let parts: Vec<&str> = match self {
            Self::Dash => SPACED_DASH.split(trimmed).collect(),
            Self::Underscore => trimmed.split('_').collect(),
            Self::Any => {
                if trimmed.contains('\t') {
                    trimmed.split('\t').collect()
                } else if SPACED_DASH.is_match(trimmed) {
                    SPACED_DASH.split(trimmed).collect()
                } else {
                    COLUMN_GAP.split(trimmed).collect()
                }
            }
        };
        parts
            .into_iter()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dash => "dash",
            Self::Underscore => "underscore",
            Self::Any => "any",
        }
    }
}

/// Split `8:00 AM - rest` into its time and the remainder.
pub fn split_leading_time(line: &str) -> Option<(&str, &str)> {
    let caps = LEADING_TIME.captures(line.trim())?;
    Some((caps.get(1)?.as_str().trim(), caps.get(2)?.as_str().trim()))
}

/// Index of the first field holding a work order id.
pub fn work_order_field(fields: &[&str]) -> Option<(usize, WorkOrderId)> {
    fields
        .iter()
        .enumerate()
        .find_map(|(i, f)| WorkOrderId::parse(f).map(|wo| (i, wo)))
}

/// A plausible person name: 1–4 alphabetic words, no digits.
pub fn looks_like_name(line: &str) -> bool {
    let words: Vec<&str> = line.split_whitespace().collect();
    (1..=4).contains(&words.len())
        && words.iter().all(|w| {
            w.chars().any(char::is_alphabetic)
                && w.chars().all(|c| c.is_alphabetic() || matches!(c, '.' | '\'' | '-'))
        })
}

/// `BRANDON HALE` → `Brandon Hale`.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
