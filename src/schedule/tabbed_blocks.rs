//! Tab-delimited multi-line dialect.
//!
//! ```text
//! 5/5/2025
//! 8:00 AM
//! Smith	Install	WO123456	123 Main St	Brandon
//! ```
//!
//! Each date/time/detail block is first joined into one tab row
//! (`date\ttime\tdetail...`), then the row is split on tabs. Rows that were
//! pasted already joined go straight to the second step. The detail columns
//! come in two layouts that differ only in where the WO sits:
//!
//! - `name, type, WO, address, ..., tech`
//! - `name, type, address, WO, ..., tech`

use super::grammar::tab_cells;
use super::timefmt::{is_date_line, is_time_line};
use super::types::{JobRecord, ParseOutput, ParseSkipReason, WorkOrderId};

/// name, type, WO/address, address/WO, tech
const MIN_DETAIL_FIELDS: usize = 5;

pub fn parse(lines: &[&str]) -> ParseOutput {
    let mut out = ParseOutput::default();
    for (index, row) in join_blocks(lines) {
        match row {
            Ok(row) => out.accept(index, lines[index], parse_row(&row)),
            Err(reason) => out.skip(index, lines[index], reason),
        }
    }
    out
}

/// Fold date and time lines into the detail row that follows them.
///
/// Returns `(line index, joined row)` per detail line. A date line resets the
/// pending time; the pending date carries over until the next date line.
pub fn join_blocks(lines: &[&str]) -> Vec<(usize, Result<String, ParseSkipReason>)> {
    let mut rows = Vec::new();
    let mut date: Option<&str> = None;
    let mut time: Option<&str> = None;

    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if line.contains('\t') {
            let first = tab_cells(line).first().copied().unwrap_or_default();
            if is_date_line(first) {
                rows.push((index, Ok(line.to_string())));
                continue;
            }
            let row = match time {
                Some(t) => Ok(format!("{}\t{t}\t{line}", date.unwrap_or_default())),
                None => Err(ParseSkipReason::MissingContext("time")),
            };
            rows.push((index, row));
        } else if is_date_line(line) {
            date = Some(line);
            time = None;
        } else if is_time_line(line) {
            time = Some(line);
        } else {
            rows.push((index, Err(ParseSkipReason::Unrecognized)));
        }
    }
    rows
}

/// Parse one joined `date\ttime\tdetail...` row.
pub fn parse_row(row: &str) -> Result<JobRecord, ParseSkipReason> {
    let cells = tab_cells(row);
    let date = cells.first().copied().filter(|d| !d.is_empty());
    let time = cells
        .get(1)
        .copied()
        .filter(|t| !t.is_empty())
        .ok_or(ParseSkipReason::MissingField("time"))?;
    let detail: Vec<&str> = cells
        .iter()
        .skip(2)
        .copied()
        .filter(|c| !c.is_empty())
        .collect();

    if detail.len() < MIN_DETAIL_FIELDS {
        if WorkOrderId::find_in(row).is_none() {
            return Err(ParseSkipReason::NoWorkOrder);
        }
        return Err(ParseSkipReason::TooFewFields {
            found: detail.len(),
            required: MIN_DETAIL_FIELDS,
        });
    }

    let (work_order, address) = if let Some(wo) = WorkOrderId::parse(detail[2]) {
        (wo, detail[3])
    } else if let Some(wo) = WorkOrderId::parse(detail[3]) {
        (wo, detail[2])
    } else {
        return Err(ParseSkipReason::NoWorkOrder);
    };

    let technician = detail[detail.len() - 1];

    Ok(JobRecord {
        date: date.map(str::to_string),
        time: time.to_string(),
        customer_name: detail[0].to_string(),
        job_type: detail[1].to_string(),
        work_order,
        address: address.to_string(),
        technician_raw: technician.to_string(),
        contractor_label: None,
    })
}

/// First few lines contain a tabbed detail row and a bare time line.
pub fn sniff(prefix: &[&str]) -> bool {
    let has_tab_row = prefix
        .iter()
        .any(|l| l.contains('\t') && WorkOrderId::find_in(l).is_some());
    let has_block_header = prefix
        .iter()
        .any(|l| !l.contains('\t') && (is_time_line(l) || is_date_line(l)));
    has_tab_row && has_block_header
}
