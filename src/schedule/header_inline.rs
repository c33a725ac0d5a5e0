//! Header-then-inline dialect.
//!
//! Technician, date and time arrive as header lines that switch the parser's
//! state; job lines beneath them carry the rest:
//!
//! ```text
//! BRANDON HALE
//! 5/5/2025
//! 8 AM
//! Smith - 10442 - Fiber Install - 12 Oak St Columbia MO 65201 - WO 123456
//! ```
//!
//! Crew sections that are not technicians (splicing, bury, cancelled work)
//! clear the technician so their jobs are skipped until the next header.

use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::grammar::title_case;
use super::timefmt::{find_us_date, is_date_line};
use super::types::{JobRecord, ParseOutput, ParseSkipReason, WorkOrderId};

/// One or two all-caps words.
static TECH_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z]{2,}(?:[\s-]+[A-Z]{2,})?$").expect("valid tech header regex")
});

static TIME_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\d{1,2}(?::\d{2})?\s?[ap]\.?m\.?$").expect("valid time header regex")
});

/// `[time -] name - account - type - address - WO 123456`
static INLINE_JOB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?ix)^
        (?:(?P<time>\d{1,2}(?::\d{2})?\s*[ap]\.?m\.?)\s+-\s+)?
        (?P<name>.+?)\s+-\s+
        (?P<account>\d{3,})\s+-\s+
        (?P<kind>.+?)\s+-\s+
        (?P<address>.+?)\s+-\s+
        WO\s*\#?\s*:?\s*(?P<wo>\d{6})\b",
    )
    .expect("valid inline job regex")
});

/// Crew labels that are not assignable technicians.
const SKIP_LABELS: [&str; 9] = [
    "SPLICING",
    "SPLICE",
    "DROP CREW",
    "BURY",
    "ENGINEERING",
    "STL",
    "PRE-BURY",
    "UNASSIGNED",
    "CANCELLED",
];

/// Section headers whose jobs are never assigned.
const SECTION_KEYWORDS: [&str; 4] = ["UNASSIGNED", "RESCHEDULE", "CANCELLED", "PRE-BURY"];

/// Role words that may sit under a technician's name in a two-line header.
const CREW_LABELS: [&str; 5] = ["TECH", "TECHNICIAN", "INSTALLER", "CREW", "LEAD"];

const TYPE_KEYWORDS: [&str; 4] = ["fiber", "connectorized", "install", "service"];

#[derive(Debug, Default)]
struct HeaderState {
    technician: Option<String>,
    /// Why `technician` is empty, when a crew or section header cleared it.
    excluded: Option<String>,
    date: Option<String>,
    time: Option<String>,
}

impl HeaderState {
    fn clear_technician(&mut self, reason: &str) {
        self.technician = None;
        self.excluded = Some(reason.to_string());
    }

    fn set_technician(&mut self, header: &str) {
        self.technician = Some(title_case(header));
        self.excluded = None;
    }
}

pub fn parse(lines: &[&str]) -> ParseOutput {
    let mut out = ParseOutput::default();
    let mut state = HeaderState::default();
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index].trim();
        let consumed = step(&mut state, &mut out, lines, index, line);
        index += consumed;
    }
    out
}

/// Handle one line, returning how many lines it consumed.
///
/// Any line holding a work order is a job line, whatever else it contains.
fn step(
    state: &mut HeaderState,
    out: &mut ParseOutput,
    lines: &[&str],
    index: usize,
    line: &str,
) -> usize {
    if !line.contains(|c: char| c.is_alphanumeric()) {
        return 1;
    }

    if WorkOrderId::find_in(line).is_some() {
        let detail = line.trim_start_matches(|c: char| !c.is_alphanumeric());
        out.accept(index, line, parse_detail(state, detail));
        return 1;
    }

    if !line.starts_with(|c: char| c.is_alphanumeric()) {
        out.skip(index, line, ParseSkipReason::Unrecognized);
        return 1;
    }

    if let Some(keyword) = section_header(line) {
        debug!(line = index + 1, section = keyword, "section header clears technician");
        state.clear_technician(keyword);
        return 1;
    }

    if TECH_HEADER.is_match(line) {
        if is_skip_label(line) {
            state.clear_technician(line);
            return 1;
        }
        // Two-line header: name over crew label
        let next = lines.get(index + 1).map_or("", |l| l.trim());
        if is_skip_label(next) {
            state.clear_technician(next);
            return 2;
        }
        state.set_technician(line);
        return if is_crew_label(next) { 2 } else { 1 };
    }

    if let Some(date) = date_header(line) {
        state.date = Some(date.to_string());
        return 1;
    }

    if TIME_HEADER.is_match(line) {
        let mut slot = line.to_uppercase().replace([' ', '.'], "");
        if !slot.ends_with('M') {
            slot.push('M');
        }
        state.time = Some(slot);
        return 1;
    }

    out.accept(index, line, parse_detail(state, line));
    1
}

/// A short line led by a section keyword, such as `RESCHEDULED:`.
fn section_header(line: &str) -> Option<&'static str> {
    let upper = line.to_uppercase();
    let mut words = upper.split_whitespace();
    let first = words.next()?.trim_end_matches([':', '-']);
    if words.count() > 2 {
        return None;
    }
    SECTION_KEYWORDS.iter().copied().find(|k| first.starts_with(k))
}

/// A line that is a date and nothing else, optionally led by a weekday or a
/// label such as `DATE:`.
fn date_header(line: &str) -> Option<&str> {
    let Some(date) = find_us_date(line) else {
        return is_date_line(line).then_some(line);
    };
    let rest = line.replacen(date, "", 1);
    let words: Vec<&str> = rest
        .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|w| !w.is_empty())
        .collect();
    let label_only =
        words.len() <= 1 && words.iter().all(|w| w.chars().all(char::is_alphabetic));
    label_only.then_some(date)
}

fn is_skip_label(line: &str) -> bool {
    let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
    SKIP_LABELS.contains(&collapsed.as_str())
}

fn is_crew_label(line: &str) -> bool {
    CREW_LABELS.contains(&line)
}

fn parse_detail(state: &HeaderState, line: &str) -> Result<JobRecord, ParseSkipReason> {
    let Some(technician) = state.technician.as_deref() else {
        return Err(match &state.excluded {
            Some(section) => ParseSkipReason::Excluded(section.clone()),
            None => ParseSkipReason::MissingContext("technician"),
        });
    };
    let date = state
        .date
        .as_deref()
        .ok_or(ParseSkipReason::MissingContext("date"))?;

    let lower = line.to_lowercase();
    if lower.contains("splice") || lower.contains("splicing") {
        return Err(ParseSkipReason::Excluded("splice".to_string()));
    }

    if let Some(caps) = INLINE_JOB.captures(line) {
        let time = caps
            .name("time")
            .map(|m| m.as_str().to_string())
            .or_else(|| state.time.clone())
            .ok_or(ParseSkipReason::MissingContext("time"))?;
        let work_order = WorkOrderId::parse(&caps["wo"]).ok_or(ParseSkipReason::NoWorkOrder)?;
        debug!(wo = %work_order, account = &caps["account"], "inline job line");
        return Ok(JobRecord {
            date: Some(date.to_string()),
            time,
            customer_name: caps["name"].trim().to_string(),
            job_type: caps["kind"].trim().to_string(),
            work_order,
            address: caps["address"].trim().to_string(),
            technician_raw: technician.to_string(),
            contractor_label: None,
        });
    }

    let time = state
        .time
        .clone()
        .ok_or(ParseSkipReason::MissingContext("time"))?;
    classify_by_keywords(line, date, &time, technician)
}

/// Fallback for job lines that do not follow the inline order: everything up
/// to the WO is split on `-`/`_`, the type is the part naming a service and the
/// address is the part holding a state code and a number.
fn classify_by_keywords(
    line: &str,
    date: &str,
    time: &str,
    technician: &str,
) -> Result<JobRecord, ParseSkipReason> {
    let (_, wo_end) = WorkOrderId::find_span(line).ok_or(ParseSkipReason::NoWorkOrder)?;
    let work_order = WorkOrderId::find_in(line).ok_or(ParseSkipReason::NoWorkOrder)?;
    let head = &line[..wo_end];

    let parts: Vec<&str> = head
        .split(['-', '_'])
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    if parts.len() < 4 {
        return Err(ParseSkipReason::TooFewFields {
            found: parts.len(),
            required: 4,
        });
    }

    let mut job_type = None;
    let mut address = None;
    for part in &parts {
        let lower = part.to_lowercase();
        let upper = part.to_uppercase();
        if TYPE_KEYWORDS.iter().any(|k| lower.contains(k)) {
            job_type = Some(*part);
        } else if upper.contains("MO")
            && part.chars().any(|c| c.is_ascii_digit())
            && !upper.contains("WO")
        {
            address = Some(*part);
        }
    }

    Ok(JobRecord {
        date: Some(date.to_string()),
        time: time.to_string(),
        customer_name: parts[0].to_string(),
        job_type: job_type
            .ok_or(ParseSkipReason::MissingField("job type"))?
            .to_string(),
        work_order,
        address: address
            .ok_or(ParseSkipReason::MissingField("address"))?
            .to_string(),
        technician_raw: technician.to_string(),
        contractor_label: None,
    })
}

/// An all-caps technician header within the first lines, followed somewhere by
/// an `M/D/YYYY` date.
pub fn sniff(prefix: &[&str]) -> bool {
    let has_header = prefix
        .iter()
        .any(|l| TECH_HEADER.is_match(l.trim()) && !is_skip_label(l.trim()));
    let has_date = prefix.iter().any(|l| find_us_date(l).is_some());
    has_header && has_date
}
