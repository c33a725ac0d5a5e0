//! Grouped-by-technician-then-date dialect.
//!
//! ```text
//! Brandon Hale
//! 5/5/2025
//! 8:00 AM - Smith - Install - 12 Oak St - WO123456
//! 10 AM	Jones	Repair	9 Elm	WO234567
//! 5/6/2025
//! 9 AM - Lee - Install - 3 Pine - WO345678
//! ```
//!
//! A name line directly followed by a date line opens a technician block.
//! The technician carries over every job line until the next such pair; a
//! bare date line inside a block only moves the date.

use super::grammar::{looks_like_name, split_leading_time, work_order_field, Delimiter};
use super::timefmt::{is_date_line, is_time_line};
use super::types::{JobRecord, ParseOutput, ParseSkipReason, WorkOrderId};

/// customer, type, address, WO
const MIN_JOB_FIELDS: usize = 4;

pub fn parse(lines: &[&str]) -> ParseOutput {
    let mut out = ParseOutput::default();
    let mut technician: Option<&str> = None;
    let mut date: Option<&str> = None;

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if is_block_header(line, next_non_blank(lines, index)) {
            technician = Some(line);
            continue;
        }
        if is_date_line(line) {
            date = Some(line);
            continue;
        }

        let result = match split_leading_time(line) {
            Some((time, rest)) => match technician {
                Some(tech) => parse_job(time, rest, date, tech),
                None => Err(ParseSkipReason::MissingContext("technician")),
            },
            None if WorkOrderId::find_in(line).is_none() => Err(ParseSkipReason::NoWorkOrder),
            None => Err(ParseSkipReason::Unrecognized),
        };
        out.accept(index, line, result);
    }
    out
}

fn next_non_blank<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    lines
        .iter()
        .skip(index + 1)
        .copied()
        .map(str::trim)
        .find(|l| !l.is_empty())
}

fn is_block_header(line: &str, next: Option<&str>) -> bool {
    looks_like_name(line)
        && !is_date_line(line)
        && !is_time_line(line)
        && next.is_some_and(is_date_line)
}

fn parse_job(
    time: &str,
    rest: &str,
    date: Option<&str>,
    technician: &str,
) -> Result<JobRecord, ParseSkipReason> {
    let fields = Delimiter::Any.split(rest);
    let (wo_index, work_order) = work_order_field(&fields).ok_or(ParseSkipReason::NoWorkOrder)?;
    if wo_index + 1 < MIN_JOB_FIELDS {
        return Err(ParseSkipReason::TooFewFields {
            found: wo_index + 1,
            required: MIN_JOB_FIELDS,
        });
    }

    Ok(JobRecord {
        date: date.map(str::to_string),
        time: time.to_string(),
        customer_name: fields[0].to_string(),
        job_type: fields[1].to_string(),
        work_order,
        address: fields[2..wo_index].join(", "),
        technician_raw: technician.to_string(),
        contractor_label: None,
    })
}

/// A name line followed by a date line, with a time-led job somewhere after.
pub fn sniff(prefix: &[&str]) -> bool {
    let has_header = prefix
        .windows(2)
        .any(|pair| is_block_header(pair[0].trim(), Some(pair[1].trim())));
    let has_job = prefix.iter().any(|l| split_leading_time(l).is_some());
    has_header && has_job
}
