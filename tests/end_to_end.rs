//! End-to-end pipeline tests
//!
//! Paste text → dispatcher → normalization → first-job digest, using only the
//! public API.

use chrono::NaiveDate;
use tech_dispatch::config::ContractorDirectory;
use tech_dispatch::schedule::{dispatch, ParserId};
use tech_dispatch::summary::{
    available_dates, build_first_job_summary, filter_by_date_range, normalize, render_html,
    render_plain, ScheduledJob,
};
use tech_dispatch::tabular::{read_records, DelimitedFile};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, 4).unwrap()
}

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, day).unwrap()
}

fn run(text: &str, contractor: Option<&str>, format: Option<ParserId>) -> Vec<ScheduledJob> {
    let directory = ContractorDirectory::default();
    let parsed = dispatch(text, contractor, format, &directory);
    normalize(parsed.output.records, today(), &directory).jobs
}

// ============================================================================
// Paste → Digest
// ============================================================================

const SUBT_PASTE: &str = "\
5/5/2025
8:00 AM
Smith\tInstall\tWO123456\t123 Main St\tBrandon
10:00 AM
Jones\tRepair\tWO234567\t9 Elm\tBrandon
9:00 AM
Lee\tInstall\tWO345678\t1 Oak\tJeff T
";

#[test]
fn tabbed_paste_yields_first_job_digest() {
    let jobs = run(SUBT_PASTE, Some("SubT"), None);
    assert_eq!(jobs.len(), 3);
    assert_eq!(jobs[0].technician, "Brandon Hale");
    assert_eq!(jobs[2].technician, "Jeffery Thornton");
    assert_eq!(jobs[0].contractor_full_name, "Subterraneus Installs");

    let summary = build_first_job_summary(&jobs);
    assert_eq!(
        summary[&date(5)],
        vec![
            "Brandon H - 8am - Smith - Install - 123 Main St - WO 123456".to_string(),
            "Jeffery T - 9am - Lee - Install - 1 Oak - WO 345678".to_string(),
        ]
    );

    let text = render_plain(&summary);
    assert!(text.contains("Monday 05/05/2025"));
    assert!(!text.contains("234567"));
}

#[test]
fn date_time_detail_block_becomes_one_record() {
    let directory = ContractorDirectory::default();
    let parsed = dispatch(
        "5/5/2025\n8:00 AM\nSmith\tInstall\tWO123456\t123 Main St\tBrandon",
        None,
        Some(ParserId::TabbedBlocks),
        &directory,
    );
    assert_eq!(parsed.output.records.len(), 1);
    let r = &parsed.output.records[0];
    assert_eq!(r.work_order.as_str(), "123456");
    assert_eq!(r.technician_raw, "Brandon");
    assert_eq!(r.date.as_deref(), Some("5/5/2025"));
    assert_eq!(r.time, "8:00 AM");
}

#[test]
fn header_inline_paste_through_contractor_profile() {
    let paste = "\
BRANDON HALE
5/5/2025
8 AM
Smith - 10442 - Fiber Install - 12 Oak St Columbia MO 65201 - WO 123456
EMILY
TECH
5/6/2025
1 PM
Ward - 10450 - Service - 4 Birch Ln Fulton MO 65251 - WO 456789
";
    let jobs = run(paste, Some("TGS"), None);
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].technician, "Emily Moody");
    assert_eq!(available_dates(&jobs), vec![date(5), date(6)]);

    let summary = build_first_job_summary(&jobs);
    assert_eq!(summary[&date(6)][0], "Emily M - 1pm - Ward - Service - 4 Birch Ln Fulton MO 65251 - WO 456789");
}

#[test]
fn date_range_narrows_digest() {
    let paste = "\
5/5/2025
8 AM
Smith - Install - 12 Oak St - WO123456 - Carrie
5/6/2025
9 AM
Lee - Install - 3 Pine - WO345678 - Carrie
";
    let jobs = run(paste, Some("All-Clear"), None);
    assert_eq!(jobs.len(), 2);
    let kept = filter_by_date_range(jobs, Some(date(6)), None);
    let summary = build_first_job_summary(&kept);
    assert_eq!(summary.len(), 1);
    assert!(summary[&date(6)][0].starts_with("Carrie M - 9am - Lee"));
}

#[test]
fn missing_date_defaults_to_tomorrow() {
    let jobs = run("8 AM\nSmith - Install - 12 Oak St - WO123456 - Carrie", None, Some(ParserId::DashUnderscore));
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].date, date(5));
    assert!(jobs[0].date_defaulted);
}

#[test]
fn html_digest_escapes_company_text() {
    let jobs = run(
        "5/5/2025\n8:00 AM\nSmith & Sons\tInstall\tWO123456\t1 <Main>\tBrandon",
        Some("SubT"),
        None,
    );
    let html = render_html(&build_first_job_summary(&jobs));
    assert!(html.contains("<h2>Monday 05/05/2025</h2>"));
    assert!(html.contains("Smith &amp; Sons"));
    assert!(html.contains("1 &lt;Main&gt;"));
}

// ============================================================================
// Cross-Dialect Properties
// ============================================================================

#[test]
fn work_order_survives_every_delimiter_style() {
    let cases = [
        ("5/5/2025\n8 AM\nSmith\tInstall\tWO123456\t1 Oak\tBrandon", ParserId::TabbedBlocks),
        ("8 AM\nSmith - Install - 1 Oak - WO123456 - Carrie", ParserId::DashUnderscore),
        ("8 AM\nSmith_Install_1 Oak_WO123456_Carrie", ParserId::DashUnderscore),
        (
            "5/5/2025  8:00 AM  Smith  Install  WO123456  1 Oak  Dallas  Doug",
            ParserId::TabularCity,
        ),
    ];
    let directory = ContractorDirectory::default();
    for (text, format) in cases {
        let parsed = dispatch(text, None, Some(format), &directory);
        assert_eq!(parsed.output.records.len(), 1, "{format}: {:?}", parsed.output.skipped);
        assert_eq!(parsed.output.records[0].work_order.as_str(), "123456", "{format}");
    }
}

#[test]
fn garbage_is_one_skip_under_every_format() {
    let directory = ContractorDirectory::default();
    for format in ParserId::ALL {
        let parsed = dispatch("garbage text with no structure", None, Some(format), &directory);
        assert!(parsed.output.records.is_empty(), "{format}");
        assert_eq!(parsed.output.skipped.len(), 1, "{format}");
        assert_eq!(parsed.output.skipped[0].line_no, 1, "{format}");
    }
}

#[test]
fn records_without_work_order_never_reach_output() {
    let directory = ContractorDirectory::default();
    let parsed = dispatch(
        "5/5/2025\n8 AM\nSmith\tInstall\tno id here\t1 Oak\tBrandon\nJones\tRepair\tWO234567\t2 Oak\tDJ",
        Some("SubT"),
        None,
        &directory,
    );
    assert_eq!(parsed.output.records.len(), 1);
    assert_eq!(parsed.output.records[0].work_order.as_str(), "234567");
    assert_eq!(parsed.output.skipped.len(), 1);
}

// ============================================================================
// Spreadsheet Source & JSON
// ============================================================================

#[test]
fn spreadsheet_export_feeds_the_same_pipeline() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("jobs.tsv");
    std::fs::write(
        &path,
        "Date\tTime\tName\tType\tWO\tAddress\tNotes\tTech\n\
         2025-05-05 00:00:00\t8:00 AM\tSmith\tInstall\t123456.0\t1 Oak\t\tCliff\n\
         2025-05-05 00:00:00\t9:00 AM\tJones\tInstall\tn/a\t2 Oak\t\tCliff\n",
    )
    .unwrap();

    let output = read_records(&mut DelimitedFile::open(&path)).unwrap();
    assert_eq!(output.records.len(), 1);
    assert_eq!(output.skipped[0].line_no, 3);

    let jobs = normalize(output.records, today(), &ContractorDirectory::default()).jobs;
    assert_eq!(jobs[0].technician, "Clifford Kunkle");
    assert_eq!(jobs[0].date, date(5));
}

#[test]
fn jobs_serialize_to_json() {
    let jobs = run(SUBT_PASTE, Some("SubT"), None);
    let json = serde_json::to_value(&jobs).unwrap();
    assert_eq!(json[0]["record"]["work_order"], "123456");
    assert_eq!(json[0]["date"], "2025-05-05");
    assert_eq!(json[0]["technician"], "Brandon Hale");
}
