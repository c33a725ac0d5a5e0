//! Last-resort dash splitting for pastes no other dialect recognizes.
//!
//! Every line is split on `-`; the part holding the WO anchors the layout,
//! the parts before it are customer, type and address, and the last part is
//! the technician. Time and date are picked up from header lines or from a
//! leading time on the job line.

use super::grammar::split_leading_time;
use super::timefmt::{is_date_line, is_time_line};
use super::types::{JobRecord, ParseOutput, ParseSkipReason, WorkOrderId};

pub fn parse(lines: &[&str]) -> ParseOutput {
    let mut out = ParseOutput::default();
    let mut date: Option<&str> = None;
    let mut time: Option<&str> = None;

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_date_line(line) {
            date = Some(line);
            continue;
        }
        if is_time_line(line) {
            time = Some(line);
            continue;
        }
        out.accept(index, line, parse_line(line, date, time));
    }
    out
}

fn parse_line(
    line: &str,
    date: Option<&str>,
    time: Option<&str>,
) -> Result<JobRecord, ParseSkipReason> {
    let (inline_time, body) = match split_leading_time(line) {
        Some((t, rest)) => (Some(t), rest),
        None => (None, line),
    };

    let parts: Vec<&str> = body
        .split('-')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let wo_index = parts
        .iter()
        .position(|p| WorkOrderId::find_in(p).is_some() || WorkOrderId::parse(p).is_some())
        .ok_or(ParseSkipReason::NoWorkOrder)?;
    let work_order = WorkOrderId::parse(parts[wo_index])
        .or_else(|| WorkOrderId::find_in(parts[wo_index]))
        .ok_or(ParseSkipReason::NoWorkOrder)?;

    if wo_index == 0 || wo_index + 1 >= parts.len() {
        return Err(ParseSkipReason::TooFewFields {
            found: parts.len(),
            required: 3,
        });
    }
    let time = inline_time
        .or(time)
        .ok_or(ParseSkipReason::MissingContext("time"))?;

    let before = &parts[..wo_index];
    Ok(JobRecord {
        date: date.map(str::to_string),
        time: time.to_string(),
        customer_name: before[0].to_string(),
        job_type: before.get(1).copied().unwrap_or_default().to_string(),
        work_order,
        address: before.get(2..).map(|a| a.join(", ")).unwrap_or_default(),
        technician_raw: parts[parts.len() - 1].to_string(),
        contractor_label: None,
    })
}
