//! In-memory portal backed by a roster TOML file, for dry runs and tests.
//!
//! ```toml
//! [technicians]
//! "Subterraneus Installs" = ["Brandon Hale", "Jeffery Thornton"]
//! "TAK Broadband" = ["Emily Moody"]
//!
//! [work_orders.123456]
//! assigned = ["Brandon Hale"]
//!
//! [work_orders.654321]
//! missing = true
//! ```
//!
//! Work orders not listed open normally with no assignees.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::{PortalError, WorkOrderPortal};
use crate::schedule::WorkOrderId;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterFile {
    /// Contractor company → technician options
    #[serde(default)]
    pub technicians: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub work_orders: BTreeMap<WorkOrderId, WorkOrderState>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkOrderState {
    #[serde(default)]
    pub contractor: Option<String>,

    #[serde(default)]
    pub assigned: Vec<String>,

    /// The page never loads.
    #[serde(default)]
    pub missing: bool,

    /// Opens that time out before the page loads.
    #[serde(default)]
    pub flaky_opens: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RosterPortal {
    roster: RosterFile,
    open: Option<WorkOrderId>,
}

impl RosterPortal {
    pub fn new(roster: RosterFile) -> Self {
        Self { roster, open: None }
    }

    pub fn load(path: &Path) -> Result<Self, PortalError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| PortalError::Io(path.to_path_buf(), e))?;
        let roster: RosterFile = toml::from_str(&contents)
            .map_err(|e| PortalError::Parse(path.to_path_buf(), e))?;
        debug!(
            path = %path.display(),
            companies = roster.technicians.len(),
            work_orders = roster.work_orders.len(),
            "Loaded roster"
        );
        Ok(Self::new(roster))
    }

    /// Current state of a work order, if it has been touched or listed.
    pub fn work_order(&self, id: &WorkOrderId) -> Option<&WorkOrderState> {
        self.roster.work_orders.get(id)
    }

    pub fn roster(&self) -> &RosterFile {
        &self.roster
    }

    fn require_open(&mut self, id: &WorkOrderId) -> Result<&mut WorkOrderState, PortalError> {
        if self.open.as_ref() != Some(id) {
            return Err(PortalError::NotOpen(id.clone()));
        }
        Ok(self.roster.work_orders.entry(id.clone()).or_default())
    }

    fn options_for(&self, contractor: Option<&str>) -> Vec<String> {
        match contractor {
            Some(company) => self
                .roster
                .technicians
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(company))
                .map(|(_, techs)| techs.clone())
                .unwrap_or_default(),
            None => {
                let mut all: Vec<String> = Vec::new();
                for tech in self.roster.technicians.values().flatten() {
                    if !all.contains(tech) {
                        all.push(tech.clone());
                    }
                }
                all
            }
        }
    }
}

#[async_trait]
impl WorkOrderPortal for RosterPortal {
    async fn open_work_order(&mut self, id: &WorkOrderId) -> Result<WorkOrderId, PortalError> {
        self.open = None;
        let state = self.roster.work_orders.entry(id.clone()).or_default();
        if state.missing {
            return Err(PortalError::NotFound(id.clone()));
        }
        if state.flaky_opens > 0 {
            state.flaky_opens -= 1;
            return Err(PortalError::Timeout(id.clone()));
        }
        self.open = Some(id.clone());
        Ok(id.clone())
    }

    async fn set_contractor(&mut self, id: &WorkOrderId, company: &str) -> Result<(), PortalError> {
        let known = self
            .roster
            .technicians
            .keys()
            .find(|name| name.eq_ignore_ascii_case(company))
            .cloned()
            .ok_or_else(|| PortalError::UnknownContractor(company.to_string()))?;
        self.require_open(id)?.contractor = Some(known);
        Ok(())
    }

    async fn list_options(&mut self, id: &WorkOrderId) -> Result<Vec<String>, PortalError> {
        let contractor = self.require_open(id)?.contractor.clone();
        Ok(self.options_for(contractor.as_deref()))
    }

    async fn is_assigned(&mut self, id: &WorkOrderId, name: &str) -> Result<bool, PortalError> {
        let state = self.require_open(id)?;
        Ok(state.assigned.iter().any(|a| a.eq_ignore_ascii_case(name)))
    }

    async fn assign(&mut self, id: &WorkOrderId, name: &str) -> Result<(), PortalError> {
        let contractor = self.require_open(id)?.contractor.clone();
        let offered = self
            .options_for(contractor.as_deref())
            .iter()
            .any(|o| o == name);
        if !offered {
            return Err(PortalError::UnknownOption {
                work_order: id.clone(),
                name: name.to_string(),
            });
        }
        self.require_open(id)?.assigned.push(name.to_string());
        Ok(())
    }

    fn portal_name(&self) -> &str {
        "roster"
    }
}
