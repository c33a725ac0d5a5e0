//! Tabular-with-city dialect: one fixed-column row per job.
//!
//! `date | time | customer | type | WO | address | city | ... | tech`, split on
//! tabs or runs of two or more spaces. The technician is the last column.

use tracing::debug;

use super::grammar::column_cells;
use super::timefmt::is_date_line;
use super::types::{JobRecord, ParseOutput, ParseSkipReason, WorkOrderId};
use crate::config::defaults::TABULAR_MIN_FIELDS;

pub fn parse(lines: &[&str]) -> ParseOutput {
    let mut out = ParseOutput::default();
    for (index, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if is_header_row(line) {
            debug!(line = index + 1, "column header row");
            continue;
        }
        out.accept(index, line, parse_row(line));
    }
    out
}

pub fn parse_row(line: &str) -> Result<JobRecord, ParseSkipReason> {
    let fields = column_cells(line);
    if fields.len() < TABULAR_MIN_FIELDS {
        let has_wo = WorkOrderId::find_in(line).is_some()
            || fields.iter().any(|f| WorkOrderId::parse(f).is_some());
        if !has_wo {
            return Err(ParseSkipReason::NoWorkOrder);
        }
        return Err(ParseSkipReason::TooFewFields {
            found: fields.len(),
            required: TABULAR_MIN_FIELDS,
        });
    }

    let work_order = WorkOrderId::parse(fields[4]).ok_or(ParseSkipReason::NoWorkOrder)?;
    let address = format!("{}, {}", fields[5], fields[6]);

    Ok(JobRecord {
        date: Some(fields[0].to_string()),
        time: fields[1].to_string(),
        customer_name: fields[2].to_string(),
        job_type: fields[3].to_string(),
        work_order,
        address,
        technician_raw: fields[fields.len() - 1].to_string(),
        contractor_label: None,
    })
}

fn is_header_row(line: &str) -> bool {
    column_cells(line)
        .first()
        .is_some_and(|c| c.eq_ignore_ascii_case("date"))
}

/// Every non-header prefix line splits into enough columns and carries a WO.
pub fn sniff(prefix: &[&str]) -> bool {
    let rows: Vec<&&str> = prefix.iter().filter(|l| !is_header_row(l)).collect();
    !rows.is_empty()
        && rows.iter().all(|line| {
            let fields = column_cells(line);
            fields.len() >= TABULAR_MIN_FIELDS
                && line.to_uppercase().contains("WO")
                && fields.first().is_some_and(|d| is_date_line(d))
        })
}
