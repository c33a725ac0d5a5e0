//! Sequential assignment loop.
//!
//! One job at a time: open and verify the work order (bounded retry with a
//! fixed sleep), set the contractor company, fetch the technician options
//! fresh, match, check for an existing assignment, then assign. Any failure
//! is recorded on that job and the loop moves on.
//!
//! [`spawn_batch`] runs the same loop as a single background task and streams
//! [`StatusLine`]s back, for front ends that must stay responsive.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::{PortalError, WorkOrderPortal};
use crate::config::{ContractorDirectory, PortalConfig};
use crate::matching::{match_dropdown_option, MatchOutcome, MatchTier};
use crate::schedule::WorkOrderId;
use crate::summary::ScheduledJob;

// ============================================================================
// Settings & Results
// ============================================================================

#[derive(Debug, Clone)]
pub struct RunnerSettings {
    pub verify_attempts: u32,
    pub retry_delay: Duration,
    pub assign_contractor: bool,
}

impl From<&PortalConfig> for RunnerSettings {
    fn from(config: &PortalConfig) -> Self {
        Self {
            verify_attempts: config.verify_attempts.max(1),
            retry_delay: Duration::from_secs(config.retry_delay_secs),
            assign_contractor: config.assign_contractor,
        }
    }
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self::from(&PortalConfig::default())
    }
}

/// Why a job was not assigned.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignSkip {
    NoTechnician,
    NotVerified { attempts: u32, last_error: String },
    NoMatch {
        raw: String,
        corrected: String,
        contractor: String,
    },
    Ambiguous {
        raw: String,
        candidates: Vec<String>,
        contractor: String,
    },
    Portal(String),
}

impl std::fmt::Display for AssignSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoTechnician => write!(f, "no technician"),
            Self::NotVerified { attempts, last_error } => {
                write!(f, "not verified after {attempts} attempts: {last_error}")
            }
            Self::NoMatch {
                raw,
                corrected,
                contractor,
            } => write!(
                f,
                "no option matches '{raw}' (corrected '{corrected}') for {contractor}"
            ),
            Self::Ambiguous {
                raw,
                candidates,
                contractor,
            } => write!(
                f,
                "'{raw}' is ambiguous for {contractor}: {}",
                candidates.join(", ")
            ),
            Self::Portal(e) => write!(f, "portal error: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssignOutcome {
    Assigned { option: String, tier: MatchTier },
    AlreadyAssigned { option: String },
    Skipped(AssignSkip),
}

#[derive(Debug, Clone)]
pub struct JobResult {
    pub work_order: WorkOrderId,
    pub technician_raw: String,
    pub outcome: AssignOutcome,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub results: Vec<JobResult>,
}

impl BatchReport {
    pub fn assigned(&self) -> usize {
        self.count(|o| matches!(o, AssignOutcome::Assigned { .. }))
    }

    pub fn already_assigned(&self) -> usize {
        self.count(|o| matches!(o, AssignOutcome::AlreadyAssigned { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, AssignOutcome::Skipped(_)))
    }

    fn count(&self, pred: impl Fn(&AssignOutcome) -> bool) -> usize {
        self.results.iter().filter(|r| pred(&r.outcome)).count()
    }
}

// ============================================================================
// Status Stream
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

/// One operator-facing line; each is meaningful on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub level: StatusLevel,
    pub message: String,
}

// ============================================================================
// Runner
// ============================================================================

pub struct AssignmentRunner {
    directory: Arc<ContractorDirectory>,
    settings: RunnerSettings,
    status: Option<mpsc::UnboundedSender<StatusLine>>,
}

impl AssignmentRunner {
    pub fn new(directory: Arc<ContractorDirectory>, settings: RunnerSettings) -> Self {
        Self {
            directory,
            settings,
            status: None,
        }
    }

    /// Mirror every log line to a status channel.
    pub fn with_status(mut self, tx: mpsc::UnboundedSender<StatusLine>) -> Self {
        self.status = Some(tx);
        self
    }

    /// Process every job in order. Matched jobs get their `technician`
    /// replaced by the selected option.
    pub async fn run<P>(&self, portal: &mut P, jobs: &mut [ScheduledJob]) -> BatchReport
    where
        P: WorkOrderPortal + ?Sized,
    {
        info!(portal = portal.portal_name(), jobs = jobs.len(), "Starting assignment batch");
        let mut report = BatchReport::default();

        for job in jobs.iter_mut() {
            let outcome = self.process(portal, job).await;
            report.results.push(JobResult {
                work_order: job.work_order().clone(),
                technician_raw: job.record.technician_raw.clone(),
                outcome,
            });
        }

        self.emit(
            StatusLevel::Info,
            format!(
                "Done: {} assigned, {} already assigned, {} skipped",
                report.assigned(),
                report.already_assigned(),
                report.skipped()
            ),
        );
        report
    }

    async fn process<P>(&self, portal: &mut P, job: &mut ScheduledJob) -> AssignOutcome
    where
        P: WorkOrderPortal + ?Sized,
    {
        let id = job.work_order().clone();
        let raw = job.record.technician_raw.trim().to_string();
        if raw.is_empty() {
            return self.skip(&id, AssignSkip::NoTechnician);
        }

        if let Err(skip) = self.verify(portal, &id).await {
            return self.fail(&id, skip);
        }

        let company = job.contractor_full_name.clone();
        if self.settings.assign_contractor && !company.is_empty() {
            if let Err(e) = portal.set_contractor(&id, &company).await {
                return self.fail(&id, AssignSkip::Portal(e.to_string()));
            }
        }

        let options = match portal.list_options(&id).await {
            Ok(options) => options,
            Err(e) => return self.fail(&id, AssignSkip::Portal(e.to_string())),
        };

        let contractor = if company.is_empty() {
            "no contractor".to_string()
        } else {
            company.clone()
        };
        let outcome = match_dropdown_option(&options, &raw, &company, &self.directory);
        let (option, tier) = match outcome {
            MatchOutcome::Matched { option, tier } => (option, tier),
            MatchOutcome::Ambiguous { candidates, .. } => {
                return self.skip(
                    &id,
                    AssignSkip::Ambiguous {
                        raw,
                        candidates,
                        contractor,
                    },
                );
            }
            MatchOutcome::NoMatch { corrected } => {
                return self.skip(
                    &id,
                    AssignSkip::NoMatch {
                        raw,
                        corrected,
                        contractor,
                    },
                );
            }
        };
        job.technician.clone_from(&option);

        match portal.is_assigned(&id, &option).await {
            Ok(true) => {
                self.emit(
                    StatusLevel::Info,
                    format!("ALREADY WO {id}: '{option}' is already assigned"),
                );
                return AssignOutcome::AlreadyAssigned { option };
            }
            Ok(false) => {}
            Err(e) => return self.fail(&id, AssignSkip::Portal(e.to_string())),
        }

        if let Err(e) = portal.assign(&id, &option).await {
            return self.fail(&id, AssignSkip::Portal(e.to_string()));
        }
        self.emit(
            StatusLevel::Info,
            format!("ASSIGNED WO {id}: '{raw}' -> '{option}' ({tier})"),
        );
        AssignOutcome::Assigned { option, tier }
    }

    /// Open the work order until the page shows the right id.
    async fn verify<P>(&self, portal: &mut P, id: &WorkOrderId) -> Result<(), AssignSkip>
    where
        P: WorkOrderPortal + ?Sized,
    {
        let attempts = self.settings.verify_attempts.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match portal.open_work_order(id).await {
                Ok(shown) if &shown == id => return Ok(()),
                Ok(shown) => {
                    last_error = PortalError::Mismatch {
                        expected: id.clone(),
                        shown,
                    }
                    .to_string();
                }
                Err(e) => last_error = e.to_string(),
            }
            warn!(
                wo = %id,
                attempt,
                max = attempts,
                error = %last_error,
                "Work order verification failed"
            );
            if attempt < attempts && !self.settings.retry_delay.is_zero() {
                tokio::time::sleep(self.settings.retry_delay).await;
            }
        }

        Err(AssignSkip::NotVerified {
            attempts,
            last_error,
        })
    }

    fn skip(&self, id: &WorkOrderId, reason: AssignSkip) -> AssignOutcome {
        self.emit(StatusLevel::Warn, format!("SKIP WO {id}: {reason}"));
        AssignOutcome::Skipped(reason)
    }

    fn fail(&self, id: &WorkOrderId, reason: AssignSkip) -> AssignOutcome {
        self.emit(StatusLevel::Error, format!("FAILED WO {id}: {reason}"));
        AssignOutcome::Skipped(reason)
    }

    fn emit(&self, level: StatusLevel, message: String) {
        match level {
            StatusLevel::Info => info!("{}", message),
            StatusLevel::Warn => warn!("{}", message),
            StatusLevel::Error => error!("{}", message),
        }
        if let Some(tx) = &self.status {
            // Receiver gone means nobody is watching; the log still has it
            let _ = tx.send(StatusLine { level, message });
        }
    }
}

// ============================================================================
// Background Task Boundary
// ============================================================================

/// A batch running on its own task.
pub struct BatchHandle<P> {
    pub status: mpsc::UnboundedReceiver<StatusLine>,
    pub join: JoinHandle<(P, Vec<ScheduledJob>, BatchReport)>,
}

/// Run a whole batch as one background task. The portal and jobs are handed
/// back when the task completes.
pub fn spawn_batch<P>(
    mut portal: P,
    mut jobs: Vec<ScheduledJob>,
    directory: Arc<ContractorDirectory>,
    settings: RunnerSettings,
) -> BatchHandle<P>
where
    P: WorkOrderPortal + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let runner = AssignmentRunner::new(directory, settings).with_status(tx);
    let join = tokio::spawn(async move {
        let report = runner.run(&mut portal, &mut jobs).await;
        (portal, jobs, report)
    });
    BatchHandle { status: rx, join }
}
