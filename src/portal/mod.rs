//! Work order portal abstraction.
//!
//! The ticketing system is driven through [`WorkOrderPortal`]; the
//! assignment loop never knows whether it is talking to a browser session or
//! the in-memory [`RosterPortal`]. Every method reports failure as a
//! [`PortalError`] value so one bad work order never ends a batch.

pub mod roster;
pub mod runner;

use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;

use crate::schedule::WorkOrderId;

pub use roster::{RosterFile, RosterPortal, WorkOrderState};
pub use runner::{
    spawn_batch, AssignOutcome, AssignSkip, AssignmentRunner, BatchHandle, BatchReport, JobResult,
    RunnerSettings, StatusLevel, StatusLine,
};

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("work order {0} could not be opened")]
    NotFound(WorkOrderId),

    #[error("timed out opening work order {0}")]
    Timeout(WorkOrderId),

    #[error("page shows work order {shown}, expected {expected}")]
    Mismatch {
        expected: WorkOrderId,
        shown: WorkOrderId,
    },

    #[error("work order {0} is not the open page")]
    NotOpen(WorkOrderId),

    #[error("contractor '{0}' is not offered")]
    UnknownContractor(String),

    #[error("'{name}' is not an option on work order {work_order}")]
    UnknownOption { work_order: WorkOrderId, name: String },

    #[error("Roster I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Roster parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),
}

/// Operations the assignment loop needs from the ticketing system.
///
/// `open_work_order` must be called first for each work order; the other
/// methods act on the open page.
#[async_trait]
pub trait WorkOrderPortal: Send {
    /// Navigate to a work order and return the id the page reports.
    async fn open_work_order(&mut self, id: &WorkOrderId) -> Result<WorkOrderId, PortalError>;

    /// Assign the contractor company, which scopes the technician options.
    async fn set_contractor(&mut self, id: &WorkOrderId, company: &str) -> Result<(), PortalError>;

    /// Technician options currently selectable, in display order.
    async fn list_options(&mut self, id: &WorkOrderId) -> Result<Vec<String>, PortalError>;

    /// Whether `name` already appears among the work order's assignees.
    async fn is_assigned(&mut self, id: &WorkOrderId, name: &str) -> Result<bool, PortalError>;

    /// Select `name` and submit.
    async fn assign(&mut self, id: &WorkOrderId, name: &str) -> Result<(), PortalError>;

    /// Human-readable name for logging.
    fn portal_name(&self) -> &str;
}
