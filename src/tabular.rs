//! Spreadsheet ingestion.
//!
//! Rows come from a [`TabularSource`] with a fixed column layout:
//!
//! | Col | A    | B    | C    | D    | E  | F       | G     | H    |
//! |-----|------|------|------|------|----|---------|-------|------|
//! |     | Date | Time | Name | Type | WO | Address | Notes | Tech |
//!
//! Row 1 is the header, so data row `i` (0-based) is spreadsheet row `i + 2`;
//! skips are reported with that number so the operator can find the cell.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::schedule::{JobRecord, ParseOutput, ParseSkipReason, SkippedLine, WorkOrderId};

pub const COLUMN_DATE: usize = 0;
pub const COLUMN_TIME: usize = 1;
pub const COLUMN_NAME: usize = 2;
pub const COLUMN_TYPE: usize = 3;
pub const COLUMN_WO: usize = 4;
pub const COLUMN_ADDRESS: usize = 5;
pub const COLUMN_TECH: usize = 7;

/// One data row, cells in column order.
pub type Row = Vec<String>;

#[derive(Debug, Error)]
pub enum TabularError {
    #[error("Spreadsheet read error ({}): {1}", .0.display())]
    Read(PathBuf, #[source] csv::Error),

    #[error("Spreadsheet {0} has no header row")]
    Empty(String),
}

/// Where spreadsheet rows come from.
pub trait TabularSource {
    /// Data rows, header excluded.
    fn rows(&mut self) -> Result<Vec<Row>, TabularError>;

    /// Human-readable name for logging.
    fn source_name(&self) -> &str;
}

// ============================================================================
// Delimited File (TSV / CSV export)
// ============================================================================

pub struct DelimitedFile {
    path: PathBuf,
    name: String,
    delimiter: u8,
}

impl DelimitedFile {
    /// `.csv` files split on commas, everything else on tabs.
    pub fn open(path: &Path) -> Self {
        let is_csv = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
        Self::with_delimiter(path, if is_csv { b',' } else { b'\t' })
    }

    pub fn with_delimiter(path: &Path, delimiter: u8) -> Self {
        Self {
            path: path.to_path_buf(),
            name: path.display().to_string(),
            delimiter,
        }
    }

    fn read_error(&self, err: csv::Error) -> TabularError {
        TabularError::Read(self.path.clone(), err)
    }
}

impl TabularSource for DelimitedFile {
    /// One row per record, so a quoted cell spanning lines stays in its row.
    fn rows(&mut self) -> Result<Vec<Row>, TabularError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|e| self.read_error(e))?;

        let headers = reader.headers().map_err(|e| self.read_error(e))?;
        if headers.is_empty() {
            return Err(TabularError::Empty(self.name.clone()));
        }

        reader
            .records()
            .map(|record| {
                record
                    .map(|r| r.iter().map(ToString::to_string).collect())
                    .map_err(|e| self.read_error(e))
            })
            .collect()
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Row Mapping
// ============================================================================

/// Read every row from `source` into job records.
pub fn read_records(source: &mut dyn TabularSource) -> Result<ParseOutput, TabularError> {
    let rows = source.rows()?;
    let output = records_from_rows(&rows);
    info!(
        source = source.source_name(),
        rows = rows.len(),
        records = output.records.len(),
        skipped = output.skipped.len(),
        "Read spreadsheet"
    );
    Ok(output)
}

/// Map rows to records. Blank rows are ignored; rows missing a date, work
/// order or technician are skipped.
pub fn records_from_rows(rows: &[Row]) -> ParseOutput {
    let mut output = ParseOutput::default();

    for (index, row) in rows.iter().enumerate() {
        if row.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let row_no = index + 2;
        match row_to_record(row) {
            Ok(record) => output.push(record),
            Err(reason) => {
                warn!(row = row_no, %reason, "SKIP spreadsheet row {}: {}", row_no, reason);
                output.skipped.push(SkippedLine {
                    line_no: row_no,
                    line: row.join("\t"),
                    reason,
                });
            }
        }
    }
    output
}

fn row_to_record(row: &[String]) -> Result<JobRecord, ParseSkipReason> {
    let cell = |i: usize| row.get(i).map_or("", |c| c.trim());

    let date = cell(COLUMN_DATE);
    if date.is_empty() {
        return Err(ParseSkipReason::MissingField("date"));
    }
    let wo = cell(COLUMN_WO);
    if wo.is_empty() {
        return Err(ParseSkipReason::MissingField("work order"));
    }
    let work_order = WorkOrderId::parse(wo).ok_or(ParseSkipReason::NoWorkOrder)?;
    let technician = cell(COLUMN_TECH);
    if technician.is_empty() {
        return Err(ParseSkipReason::MissingField("technician"));
    }

    Ok(JobRecord {
        date: Some(date.to_string()),
        time: cell(COLUMN_TIME).to_string(),
        customer_name: cell(COLUMN_NAME).to_string(),
        job_type: cell(COLUMN_TYPE).to_string(),
        work_order,
        address: cell(COLUMN_ADDRESS).to_string(),
        technician_raw: technician.to_string(),
        contractor_label: None,
    })
}
