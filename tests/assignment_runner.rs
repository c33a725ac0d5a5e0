//! Assignment loop tests against the in-memory roster portal.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;

use tech_dispatch::config::ContractorDirectory;
use tech_dispatch::matching::MatchTier;
use tech_dispatch::portal::{
    spawn_batch, AssignOutcome, AssignSkip, AssignmentRunner, PortalError, RosterFile,
    RosterPortal, RunnerSettings, StatusLevel, WorkOrderPortal,
};
use tech_dispatch::schedule::{JobRecord, WorkOrderId};
use tech_dispatch::summary::{normalize, ScheduledJob};

const ROSTER: &str = r#"
[technicians]
"Subterraneus Installs" = ["Brandon Hale", "Jeffery Thornton", "Darnell Jackson"]
"TAK Broadband" = ["Emily Moody", "Emma Stone"]

[work_orders.234567]
assigned = ["Jeffery Thornton"]

[work_orders.345678]
missing = true

[work_orders.456789]
flaky_opens = 2
"#;

fn settings() -> RunnerSettings {
    RunnerSettings {
        verify_attempts: 3,
        retry_delay: Duration::ZERO,
        assign_contractor: true,
    }
}

fn wo(id: &str) -> WorkOrderId {
    WorkOrderId::parse(id).unwrap()
}

fn record(label: &str, id: &str, tech: &str) -> JobRecord {
    JobRecord {
        date: Some("5/5/2025".to_string()),
        time: "8 AM".to_string(),
        customer_name: "Smith".to_string(),
        job_type: "Install".to_string(),
        work_order: wo(id),
        address: "1 Oak".to_string(),
        technician_raw: tech.to_string(),
        contractor_label: Some(label.to_string()),
    }
}

fn jobs(records: Vec<JobRecord>) -> Vec<ScheduledJob> {
    let today = NaiveDate::from_ymd_opt(2025, 5, 4).unwrap();
    normalize(records, today, &ContractorDirectory::default()).jobs
}

fn portal() -> RosterPortal {
    RosterPortal::new(toml::from_str::<RosterFile>(ROSTER).unwrap())
}

fn runner() -> AssignmentRunner {
    AssignmentRunner::new(Arc::new(ContractorDirectory::default()), settings())
}

// ============================================================================
// Sequential Loop
// ============================================================================

#[tokio::test]
async fn mixed_batch_never_aborts() {
    let mut portal = portal();
    let mut batch = jobs(vec![
        record("SubT", "123456", "Brandon"),
        record("SubT", "234567", "Jeff T"),
        record("SubT", "345678", "DJ"),
        record("SubT", "456789", "Brandon"),
        record("SubT", "567890", "Zed"),
        record("TGS", "678901", "Em"),
    ]);

    let report = runner().run(&mut portal, &mut batch).await;

    assert_eq!(report.results.len(), 6);
    assert_eq!(report.assigned(), 2);
    assert_eq!(report.already_assigned(), 1);
    assert_eq!(report.skipped(), 3);

    assert_eq!(
        report.results[0].outcome,
        AssignOutcome::Assigned {
            option: "Brandon Hale".to_string(),
            tier: MatchTier::Exact
        }
    );
    assert_eq!(
        report.results[1].outcome,
        AssignOutcome::AlreadyAssigned {
            option: "Jeffery Thornton".to_string()
        }
    );
    assert!(matches!(
        report.results[2].outcome,
        AssignOutcome::Skipped(AssignSkip::NotVerified { attempts: 3, .. })
    ));
    assert!(matches!(report.results[3].outcome, AssignOutcome::Assigned { .. }));
    assert!(matches!(
        report.results[4].outcome,
        AssignOutcome::Skipped(AssignSkip::NoMatch { .. })
    ));
    match &report.results[5].outcome {
        AssignOutcome::Skipped(AssignSkip::Ambiguous {
            raw,
            candidates,
            contractor,
        }) => {
            assert_eq!(raw, "Em");
            assert_eq!(candidates, &["Emily Moody".to_string(), "Emma Stone".to_string()]);
            assert_eq!(contractor, "TAK Broadband");
        }
        other => panic!("expected ambiguous skip, got {other:?}"),
    }
}

#[tokio::test]
async fn assignment_updates_portal_and_job() {
    let mut portal = portal();
    let mut batch = jobs(vec![record("SubT", "123456", "brandon")]);

    runner().run(&mut portal, &mut batch).await;

    let state = portal.work_order(&wo("123456")).unwrap();
    assert_eq!(state.assigned, vec!["Brandon Hale".to_string()]);
    assert_eq!(state.contractor.as_deref(), Some("Subterraneus Installs"));
    assert_eq!(batch[0].technician, "Brandon Hale");
}

#[tokio::test]
async fn flaky_page_succeeds_within_attempt_budget() {
    let mut portal = portal();
    let mut batch = jobs(vec![record("SubT", "456789", "Darnell Jackson")]);

    let report = runner().run(&mut portal, &mut batch).await;
    assert_eq!(
        report.results[0].outcome,
        AssignOutcome::Assigned {
            option: "Darnell Jackson".to_string(),
            tier: MatchTier::Raw
        }
    );
}

#[tokio::test]
async fn too_few_attempts_skip_flaky_page() {
    let mut portal = portal();
    let mut batch = jobs(vec![record("SubT", "456789", "Brandon")]);
    let runner = AssignmentRunner::new(
        Arc::new(ContractorDirectory::default()),
        RunnerSettings {
            verify_attempts: 2,
            ..settings()
        },
    );

    let report = runner.run(&mut portal, &mut batch).await;
    match &report.results[0].outcome {
        AssignOutcome::Skipped(AssignSkip::NotVerified { attempts, last_error }) => {
            assert_eq!(*attempts, 2);
            assert!(last_error.contains("timed out"));
        }
        other => panic!("expected verification skip, got {other:?}"),
    }
    assert!(portal.work_order(&wo("456789")).unwrap().assigned.is_empty());
}

#[tokio::test]
async fn without_contractor_step_options_span_all_companies() {
    let mut portal = portal();
    let mut batch = jobs(vec![record("TGS", "111111", "Emily")]);
    let runner = AssignmentRunner::new(
        Arc::new(ContractorDirectory::default()),
        RunnerSettings {
            assign_contractor: false,
            ..settings()
        },
    );

    let report = runner.run(&mut portal, &mut batch).await;
    assert_eq!(report.assigned(), 1);
    assert_eq!(portal.work_order(&wo("111111")).unwrap().contractor, None);
}

#[tokio::test]
async fn blank_technician_is_skipped_before_portal() {
    let mut portal = portal();
    let mut batch = jobs(vec![record("SubT", "123456", "Brandon")]);
    batch[0].record.technician_raw = "  ".to_string();

    let report = runner().run(&mut portal, &mut batch).await;
    assert_eq!(
        report.results[0].outcome,
        AssignOutcome::Skipped(AssignSkip::NoTechnician)
    );
    assert!(portal.work_order(&wo("123456")).is_none());
}

#[tokio::test]
async fn name_resolution_skips_name_the_contractor() {
    let batch = jobs(vec![
        record("TGS", "678901", "Em"),
        record("SubT", "567890", "Zed"),
    ]);
    let mut handle = spawn_batch(
        portal(),
        batch,
        Arc::new(ContractorDirectory::default()),
        settings(),
    );

    let mut skips = Vec::new();
    while let Some(line) = handle.status.recv().await {
        if line.level == StatusLevel::Warn && line.message.starts_with("SKIP WO") {
            skips.push(line.message);
        }
    }
    handle.join.await.unwrap();

    assert_eq!(skips.len(), 2);
    assert!(skips[0].contains("ambiguous for TAK Broadband"), "{}", skips[0]);
    assert!(skips[1].contains("for Subterraneus Installs"), "{}", skips[1]);
}

// ============================================================================
// Page Mismatch
// ============================================================================

/// Always lands on the same work order regardless of what was asked for.
struct StuckPortal {
    shown: WorkOrderId,
    opens: u32,
}

#[async_trait]
impl WorkOrderPortal for StuckPortal {
    async fn open_work_order(&mut self, _id: &WorkOrderId) -> Result<WorkOrderId, PortalError> {
        self.opens += 1;
        Ok(self.shown.clone())
    }

    async fn set_contractor(&mut self, _id: &WorkOrderId, _company: &str) -> Result<(), PortalError> {
        Ok(())
    }

    async fn list_options(&mut self, _id: &WorkOrderId) -> Result<Vec<String>, PortalError> {
        Ok(vec!["Brandon Hale".to_string()])
    }

    async fn is_assigned(&mut self, _id: &WorkOrderId, _name: &str) -> Result<bool, PortalError> {
        Ok(false)
    }

    async fn assign(&mut self, id: &WorkOrderId, _name: &str) -> Result<(), PortalError> {
        Err(PortalError::NotOpen(id.clone()))
    }

    fn portal_name(&self) -> &str {
        "stuck"
    }
}

#[tokio::test]
async fn page_mismatch_exhausts_attempts() {
    let mut portal = StuckPortal {
        shown: wo("999999"),
        opens: 0,
    };
    let mut batch = jobs(vec![record("SubT", "123456", "Brandon")]);

    let report = runner().run(&mut portal, &mut batch).await;
    assert_eq!(portal.opens, 3);
    match &report.results[0].outcome {
        AssignOutcome::Skipped(AssignSkip::NotVerified { last_error, .. }) => {
            assert!(last_error.contains("999999"));
        }
        other => panic!("expected verification skip, got {other:?}"),
    }
}

#[test]
fn portal_trait_objects_drive_the_runner() {
    tokio_test::block_on(async {
        let mut portal: Box<dyn WorkOrderPortal> = Box::new(portal());
        let mut batch = jobs(vec![record("SubT", "123456", "Jeff T")]);
        let report = runner().run(portal.as_mut(), &mut batch).await;
        assert_eq!(report.assigned(), 1);
    });
}

// ============================================================================
// Background Task Boundary
// ============================================================================

#[tokio::test]
async fn spawned_batch_streams_status_and_returns_state() {
    let batch = jobs(vec![
        record("SubT", "123456", "Brandon"),
        record("SubT", "345678", "DJ"),
    ]);
    let mut handle = spawn_batch(
        portal(),
        batch,
        Arc::new(ContractorDirectory::default()),
        settings(),
    );

    let mut lines = Vec::new();
    while let Some(line) = handle.status.recv().await {
        lines.push(line);
    }
    let (portal, jobs, report) = handle.join.await.unwrap();

    assert!(lines
        .iter()
        .any(|l| l.level == StatusLevel::Info && l.message.starts_with("ASSIGNED WO 123456")));
    assert!(lines
        .iter()
        .any(|l| l.level == StatusLevel::Error && l.message.starts_with("FAILED WO 345678")));
    assert!(lines.last().unwrap().message.starts_with("Done: 1 assigned"));

    assert_eq!(report.assigned(), 1);
    assert_eq!(jobs[0].technician, "Brandon Hale");
    assert_eq!(
        portal.work_order(&wo("123456")).unwrap().assigned,
        vec!["Brandon Hale".to_string()]
    );
}
