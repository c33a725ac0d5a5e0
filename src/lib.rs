//! Tech Dispatch: contractor schedules to assigned work orders
//!
//! Turns the schedules contractors paste (or export as spreadsheets) into
//! job records, resolves each technician nickname to a selectable name on the
//! work order form, and builds the daily first-job digest.
//!
//! ## Architecture
//!
//! - **Schedule**: per-contractor dialect parsers behind a sniffing dispatcher
//! - **Matching**: nickname correction and dropdown option matching
//! - **Summary**: date normalization and the first-job-of-the-day digest
//! - **Portal**: work order portal trait and the sequential assignment loop

pub mod config;
pub mod logging;
pub mod matching;
pub mod portal;
pub mod schedule;
pub mod summary;
pub mod tabular;

// Re-export configuration
pub use config::{ContractorDirectory, DispatchConfig};

// Re-export parsing
pub use schedule::{dispatch, JobRecord, ParseOutput, ParserId, WorkOrderId};

// Re-export matching
pub use matching::{correct_name, match_dropdown_option, MatchOutcome};

// Re-export summary
pub use summary::{build_first_job_summary, normalize, ScheduledJob};

// Re-export portal
pub use portal::{AssignmentRunner, PortalError, RosterPortal, WorkOrderPortal};
