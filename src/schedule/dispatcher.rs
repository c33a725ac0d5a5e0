//! Format dispatcher: picks the dialect parser for a paste.
//!
//! An explicit format wins, then the selected contractor's dialect, then
//! structural sniffing of the first few non-blank lines. Sniffs run in a
//! fixed priority order and the first hit decides; anything unrecognized
//! falls through to the legacy dash splitter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, warn};

use super::types::ParseOutput;
use super::{
    dash_underscore, day_month_rows, grouped_technician, header_inline, legacy, tabbed_blocks,
    tabular_city,
};
use crate::config::defaults::SNIFF_PREFIX_LINES;
use crate::config::ContractorDirectory;

/// A pure parser from raw lines to records and skips.
pub type ParseFn = fn(&[&str]) -> ParseOutput;

/// Structural test over the first non-blank lines of a paste.
pub type SniffFn = fn(&[&str]) -> bool;

/// Identifies one schedule dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParserId {
    TabbedBlocks,
    HeaderInline,
    DashUnderscore,
    TabularCity,
    GroupedTechnician,
    DayMonthRows,
    Legacy,
}

impl ParserId {
    pub const ALL: [Self; 7] = [
        Self::TabbedBlocks,
        Self::HeaderInline,
        Self::DashUnderscore,
        Self::TabularCity,
        Self::GroupedTechnician,
        Self::DayMonthRows,
        Self::Legacy,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::TabbedBlocks => "tabbed_blocks",
            Self::HeaderInline => "header_inline",
            Self::DashUnderscore => "dash_underscore",
            Self::TabularCity => "tabular_city",
            Self::GroupedTechnician => "grouped_technician",
            Self::DayMonthRows => "day_month_rows",
            Self::Legacy => "legacy",
        }
    }

    pub fn parser(self) -> ParseFn {
        match self {
            Self::TabbedBlocks => tabbed_blocks::parse,
            Self::HeaderInline => header_inline::parse,
            Self::DashUnderscore => dash_underscore::parse,
            Self::TabularCity => tabular_city::parse,
            Self::GroupedTechnician => grouped_technician::parse,
            Self::DayMonthRows => day_month_rows::parse,
            Self::Legacy => legacy::parse,
        }
    }
}

impl fmt::Display for ParserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|id| id.name() == wanted)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|id| id.name()).collect();
                format!("unknown format '{s}', expected one of: {}", names.join(", "))
            })
    }
}

/// Sniffs in priority order. Header-led dialects come before the tabbed
/// block sniff because their job lines may also contain tabs.
const FORMAT_CHAIN: [(ParserId, SniffFn); 6] = [
    (ParserId::DayMonthRows, day_month_rows::sniff),
    (ParserId::TabularCity, tabular_city::sniff),
    (ParserId::HeaderInline, header_inline::sniff),
    (ParserId::GroupedTechnician, grouped_technician::sniff),
    (ParserId::TabbedBlocks, tabbed_blocks::sniff),
    (ParserId::DashUnderscore, dash_underscore::sniff),
];

/// First non-blank lines, trimmed.
pub fn sniff_prefix<'a>(lines: &[&'a str]) -> Vec<&'a str> {
    lines
        .iter()
        .copied()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(SNIFF_PREFIX_LINES)
        .collect()
}

/// Pick a dialect from the shape of the input alone.
pub fn detect_format(lines: &[&str]) -> ParserId {
    let prefix = sniff_prefix(lines);
    FORMAT_CHAIN
        .iter()
        .find(|(_, sniff)| sniff(&prefix))
        .map_or(ParserId::Legacy, |(id, _)| *id)
}

/// Parser choice plus its output.
#[derive(Debug, Clone)]
pub struct Dispatched {
    pub parser: ParserId,
    pub output: ParseOutput,
}

/// Parse a paste for an optional contractor.
///
/// Records are stamped with the contractor's canonical label when the label
/// is known, or the label as given otherwise.
pub fn dispatch(
    text: &str,
    contractor: Option<&str>,
    format: Option<ParserId>,
    directory: &ContractorDirectory,
) -> Dispatched {
    let lines: Vec<&str> = text.lines().collect();
    let profile = contractor.and_then(|label| {
        let found = directory.profile(label);
        if found.is_none() {
            warn!(contractor = label, "Unknown contractor label, sniffing the format instead");
        }
        found
    });

    let parser = match (format, profile.and_then(|p| p.format)) {
        (Some(id), _) => {
            debug!(parser = %id, "format chosen explicitly");
            id
        }
        (None, Some(id)) => {
            debug!(parser = %id, "format taken from contractor profile");
            id
        }
        (None, None) => {
            let id = detect_format(&lines);
            debug!(parser = %id, "format detected from input");
            id
        }
    };

    let mut output = parser.parser()(&lines);
    let label = profile
        .map(|p| p.label.clone())
        .or_else(|| contractor.map(|c| c.trim().to_string()));
    if let Some(label) = label {
        for record in &mut output.records {
            record.contractor_label = Some(label.clone());
        }
    }

    info!(
        parser = %parser,
        records = output.records.len(),
        skipped = output.skipped.len(),
        "Parsed {} jobs ({} lines skipped)",
        output.records.len(),
        output.skipped.len()
    );

    Dispatched { parser, output }
}
