//! Job record types shared by every schedule dialect.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;
use thiserror::Error;

/// `WO123456`, `WO# 123456`, `wo:123456` embedded anywhere in a line.
///
/// The leading class keeps `SWO123456` from matching while still allowing
/// underscore and dash delimiters on either side.
static EMBEDDED_WO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|[^A-Za-z])WO\s*#?\s*:?\s*(\d{6})(?:\D|$)").expect("valid WO regex")
});

/// A whole cell holding only the id, optionally prefixed or with a trailing
/// spreadsheet `.0`.
static BARE_WO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:WO\s*#?\s*:?\s*)?(\d{6})(?:\.0+)?$").expect("valid bare WO regex")
});

/// A syntactically valid 6-digit work order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkOrderId(String);

impl WorkOrderId {
    /// Parse a single cell (`123456`, `WO123456`, `WO# 123456`, `123456.0`).
    pub fn parse(cell: &str) -> Option<Self> {
        BARE_WO
            .captures(cell.trim())
            .map(|caps| Self(caps[1].to_string()))
    }

    /// Find the first WO-prefixed id embedded in free text.
    pub fn find_in(text: &str) -> Option<Self> {
        EMBEDDED_WO
            .captures(text)
            .map(|caps| Self(caps[1].to_string()))
    }

    /// Byte range of the first embedded WO id, including the `WO` prefix.
    pub fn find_span(text: &str) -> Option<(usize, usize)> {
        let caps = EMBEDDED_WO.captures(text)?;
        let whole = caps.get(0)?;
        let digits = caps.get(1)?;
        let start = text[whole.start()..]
            .find(|c: char| c == 'W' || c == 'w')
            .map_or(whole.start(), |off| whole.start() + off);
        Some((start, digits.end()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for WorkOrderId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("'{value}' is not a 6-digit work order id"))
    }
}

impl From<WorkOrderId> for String {
    fn from(id: WorkOrderId) -> Self {
        id.0
    }
}

/// One job as read from a pasted schedule, before normalization.
///
/// `date` and `time` keep the text exactly as the contractor typed it; the
/// normalizer turns them into calendar values later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobRecord {
    pub date: Option<String>,
    pub time: String,
    pub customer_name: String,
    pub job_type: String,
    pub work_order: WorkOrderId,
    pub address: String,
    pub technician_raw: String,
    /// Operator-selected contractor label, filled in by the dispatcher.
    #[serde(default)]
    pub contractor_label: Option<String>,
}

/// Why a line produced no job.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseSkipReason {
    #[error("no 6-digit work order id")]
    NoWorkOrder,

    #[error("line matches no known grammar")]
    Unrecognized,

    #[error("only {found} fields, need at least {required}")]
    TooFewFields { found: usize, required: usize },

    #[error("no {0} header seen before this line")]
    MissingContext(&'static str),

    #[error("missing {0}")]
    MissingField(&'static str),

    #[error("excluded section: {0}")]
    Excluded(String),
}

/// A rejected line with enough context for manual correction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedLine {
    /// 1-based line number in the pasted text.
    pub line_no: usize,
    pub line: String,
    pub reason: ParseSkipReason,
}

/// Records and skips produced by one parser run, both in input order.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    pub records: Vec<JobRecord>,
    pub skipped: Vec<SkippedLine>,
}

impl ParseOutput {
    pub fn push(&mut self, record: JobRecord) {
        self.records.push(record);
    }

    /// Record a skip and log it. `index` is the 0-based line index.
    pub fn skip(&mut self, index: usize, line: &str, reason: ParseSkipReason) {
        tracing::warn!(line = index + 1, %reason, "SKIP line {}: {}", index + 1, line.trim());
        self.skipped.push(SkippedLine {
            line_no: index + 1,
            line: line.to_string(),
            reason,
        });
    }

    /// Accept or skip depending on a per-line result.
    pub fn accept(&mut self, index: usize, line: &str, result: Result<JobRecord, ParseSkipReason>) {
        match result {
            Ok(record) => self.push(record),
            Err(reason) => self.skip(index, line, reason),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
