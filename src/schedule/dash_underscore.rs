//! Dash/underscore grouped dialect.
//!
//! Jobs are single inline lines grouped under optional date and time headers:
//!
//! ```text
//! 5/5/2025
//! 8 AM
//! Smith - Install - 12 Oak St - WO123456 - Carrie
//! 9:30 AM_Jones_Repair_9 Elm Ave_WO234567_Shawn M
//! ```
//!
//! The dash and underscore layouts are the same grammar with a different
//! delimiter; the dash alias is tried first.

use super::grammar::{work_order_field, Delimiter};
use super::timefmt::{is_date_line, is_time_line};
use super::types::{JobRecord, ParseOutput, ParseSkipReason, WorkOrderId};

/// `[time] name type address... WO tech...`
#[derive(Debug, Clone, Copy)]
pub struct InlineGrammar {
    delimiter: Delimiter,
}

/// Aliases in the order they are tried.
pub const ALIASES: [InlineGrammar; 2] = [
    InlineGrammar::new(Delimiter::Dash),
    InlineGrammar::new(Delimiter::Underscore),
];

impl InlineGrammar {
    pub const fn new(delimiter: Delimiter) -> Self {
        Self { delimiter }
    }

    /// Match one line, falling back to header context for date and time.
    pub fn apply(
        &self,
        line: &str,
        date: Option<&str>,
        time: Option<&str>,
    ) -> Option<Result<JobRecord, ParseSkipReason>> {
        let mut fields = self.delimiter.split(line);
        if fields.len() < 2 {
            return None;
        }

        let inline_time = if is_time_line(fields[0]) {
            Some(fields.remove(0))
        } else {
            None
        };

        let (wo_index, work_order) = work_order_field(&fields)?;
        if wo_index < 3 || wo_index + 1 >= fields.len() {
            return Some(Err(ParseSkipReason::TooFewFields {
                found: fields.len(),
                required: 5,
            }));
        }

        let Some(time) = inline_time.or(time) else {
            return Some(Err(ParseSkipReason::MissingContext("time")));
        };

        Some(Ok(JobRecord {
            date: date.map(str::to_string),
            time: time.to_string(),
            customer_name: fields[0].to_string(),
            job_type: fields[1].to_string(),
            work_order,
            address: fields[2..wo_index].join(", "),
            technician_raw: fields[wo_index + 1..].join(" "),
            contractor_label: None,
        }))
    }

    pub fn delimiter(&self) -> Delimiter {
        self.delimiter
    }
}

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
            time = None;
            continue;
        }
        if is_time_line(line) {
            time = Some(line);
            continue;
        }

        let result = ALIASES
            .iter()
            .find_map(|grammar| grammar.apply(line, date, time))
            .unwrap_or_else(|| {
                if WorkOrderId::find_in(line).is_some() {
                    Err(ParseSkipReason::Unrecognized)
                } else {
                    Err(ParseSkipReason::NoWorkOrder)
                }
            });
        out.accept(index, line, result);
    }
    out
}

/// Some prefix line splits into at least five dash or underscore fields with
/// a WO column.
pub fn sniff(prefix: &[&str]) -> bool {
    prefix.iter().any(|line| {
        !line.contains('\t')
            && ALIASES.iter().any(|g| {
                let fields = g.delimiter().split(line);
                fields.len() >= 5 && work_order_field(&fields).is_some()
            })
    })
}
