//! Day-month rows: tab rows led by a `D-Mon` date.
//!
//! `21-Apr | 8AM | customer | type | WO | address | notes... | tech`

use super::grammar::tab_cells;
use super::timefmt::is_day_month;
use super::types::{JobRecord, ParseOutput, ParseSkipReason, WorkOrderId};

/// date, time, customer, type, WO, address, tech
const MIN_CELLS: usize = 7;

pub fn parse(lines: &[&str]) -> ParseOutput {
    let mut out = ParseOutput::default();
    for (index, raw) in lines.iter().enumerate() {
        // Trailing empty cells are positional, so only whole-blank lines go
        if raw.trim().is_empty() {
            continue;
        }
        out.accept(index, raw, parse_row(raw));
    }
    out
}

pub fn parse_row(line: &str) -> Result<JobRecord, ParseSkipReason> {
    let cells = tab_cells(line);
    let Some(date) = cells.first().copied().filter(|c| is_day_month(c)) else {
        return Err(if WorkOrderId::find_in(line).is_some() {
            ParseSkipReason::MissingField("day-month date")
        } else {
            ParseSkipReason::Unrecognized
        });
    };

    if cells.len() < MIN_CELLS {
        return Err(ParseSkipReason::TooFewFields {
            found: cells.len(),
            required: MIN_CELLS,
        });
    }

    let work_order = WorkOrderId::parse(cells[4]).ok_or(ParseSkipReason::NoWorkOrder)?;
    let technician = cells[6..]
        .iter()
        .rev()
        .find(|c| !c.is_empty())
        .ok_or(ParseSkipReason::MissingField("technician"))?;

    Ok(JobRecord {
        date: Some(date.to_string()),
        time: cells[1].to_string(),
        customer_name: cells[2].to_string(),
        job_type: cells[3].to_string(),
        work_order,
        address: cells[5].to_string(),
        technician_raw: (*technician).to_string(),
        contractor_label: None,
    })
}

/// The first three non-blank lines all open with a `D-Mon` token.
pub fn sniff(prefix: &[&str]) -> bool {
    let heads: Vec<&str> = prefix
        .iter()
        .take(3)
        .filter_map(|l| l.split_whitespace().next())
        .collect();
    !heads.is_empty() && heads.iter().all(|t| is_day_month(t))
}
