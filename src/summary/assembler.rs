//! Record normalization and the first-job-of-the-day summary.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use tracing::{info, warn};

use crate::config::ContractorDirectory;
use crate::matching::{correct_name, display_name};
use crate::schedule::timefmt::{format_clock, parse_date, parse_time_with, tomorrow};
use crate::schedule::{JobRecord, WorkOrderId};

/// A parsed record with calendar values and a corrected technician name.
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledJob {
    pub record: JobRecord,
    pub date: NaiveDate,
    /// `None` when the time text could not be read; such jobs are still
    /// assignable but never appear in the first-job summary.
    pub time: Option<NaiveTime>,
    /// True when `date` is the tomorrow fallback.
    pub date_defaulted: bool,
    /// Contractor company name, empty when the label is unknown.
    pub contractor_full_name: String,
    /// Best known full name: the matched dropdown option after assignment,
    /// the corrected name before.
    pub technician: String,
}

impl ScheduledJob {
    pub fn work_order(&self) -> &WorkOrderId {
        &self.record.work_order
    }

    /// `Brandon H - 8am - Smith - Install - 123 Main St - WO 123456`
    pub fn summary_line(&self) -> Option<String> {
        let time = self.time?;
        let r = &self.record;
        Some(format!(
            "{} - {} - {} - {} - {} - WO {}",
            display_name(&self.technician),
            format_clock(time),
            r.customer_name,
            r.job_type,
            r.address,
            r.work_order
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnparseableTime {
    pub work_order: WorkOrderId,
    pub raw: String,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizeReport {
    pub jobs: Vec<ScheduledJob>,
    /// Jobs left out of the first-job summary, in input order.
    pub unparseable_times: Vec<UnparseableTime>,
    /// Records dropped for having no technician.
    pub missing_technician: Vec<WorkOrderId>,
    pub defaulted_dates: usize,
}

/// Turn parsed records into scheduled jobs.
///
/// A missing or unreadable date becomes the day after `today`; unreadable
/// times are collected and logged once, together, at the end.
pub fn normalize(
    records: Vec<JobRecord>,
    today: NaiveDate,
    directory: &ContractorDirectory,
) -> NormalizeReport {
    let mut report = NormalizeReport::default();
    let fallback = tomorrow(today);

    for record in records {
        let technician_raw = record.technician_raw.trim();
        if technician_raw.is_empty() {
            warn!(wo = %record.work_order, "SKIP WO {}: no technician", record.work_order);
            report.missing_technician.push(record.work_order.clone());
            continue;
        }

        let (date, date_defaulted) = match record.date.as_deref().map(|d| parse_date(d, today)) {
            Some(Ok(date)) => (date, false),
            Some(Err(e)) => {
                warn!(wo = %record.work_order, error = %e, "Date defaulted to {}", fallback);
                (fallback, true)
            }
            None => {
                info!(wo = %record.work_order, "No date given, defaulting to {}", fallback);
                (fallback, true)
            }
        };
        if date_defaulted {
            report.defaulted_dates += 1;
        }

        let time = parse_time_with(&record.time, directory.force_pm()).ok();
        if time.is_none() {
            report.unparseable_times.push(UnparseableTime {
                work_order: record.work_order.clone(),
                raw: record.time.clone(),
            });
        }

        let contractor_full_name = record
            .contractor_label
            .as_deref()
            .and_then(|label| directory.full_name(label))
            .unwrap_or_default()
            .to_string();
        let technician = correct_name(technician_raw, &contractor_full_name, directory);

        report.jobs.push(ScheduledJob {
            record,
            date,
            time,
            date_defaulted,
            contractor_full_name,
            technician,
        });
    }

    if !report.unparseable_times.is_empty() {
        let listing: Vec<String> = report
            .unparseable_times
            .iter()
            .map(|u| format!("WO {} '{}'", u.work_order, u.raw))
            .collect();
        warn!(
            count = report.unparseable_times.len(),
            "SKIP first-job summary for unparseable times: {}",
            listing.join(", ")
        );
    }

    report
}

/// Keep jobs dated within `from..=to`; an open end is unbounded.
pub fn filter_by_date_range(
    jobs: Vec<ScheduledJob>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<ScheduledJob> {
    jobs.into_iter()
        .filter(|j| from.map_or(true, |f| j.date >= f) && to.map_or(true, |t| j.date <= t))
        .collect()
}

/// Distinct dates, ascending.
pub fn available_dates(jobs: &[ScheduledJob]) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = jobs.iter().map(|j| j.date).collect();
    dates.sort_unstable();
    dates.dedup();
    dates
}

/// Each technician's earliest job per day, one line each.
///
/// Jobs are grouped by date and stable-sorted by time, then the first job
/// seen for each technician is kept. Ties keep input order. Jobs without a
/// readable time are left out.
pub fn build_first_job_summary(jobs: &[ScheduledJob]) -> BTreeMap<NaiveDate, Vec<String>> {
    let mut by_date: BTreeMap<NaiveDate, Vec<&ScheduledJob>> = BTreeMap::new();
    for job in jobs.iter().filter(|j| j.time.is_some()) {
        by_date.entry(job.date).or_default().push(job);
    }

    by_date
        .into_iter()
        .map(|(date, mut day)| {
            day.sort_by_key(|j| j.time);
            let mut seen = HashSet::new();
            let lines = day
                .into_iter()
                .filter(|j| seen.insert(j.technician.to_lowercase()))
                .filter_map(ScheduledJob::summary_line)
                .collect();
            (date, lines)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, 4).unwrap()
    }

    fn record(date: Option<&str>, time: &str, wo: &str, tech: &str) -> JobRecord {
        JobRecord {
            date: date.map(str::to_string),
            time: time.to_string(),
            customer_name: "Smith".to_string(),
            job_type: "Install".to_string(),
            work_order: WorkOrderId::parse(wo).unwrap(),
            address: "123 Main St".to_string(),
            technician_raw: tech.to_string(),
            contractor_label: Some("SubT".to_string()),
        }
    }

    fn jobs(records: Vec<JobRecord>) -> Vec<ScheduledJob> {
        normalize(records, today(), &ContractorDirectory::default()).jobs
    }

    #[test]
    fn keeps_only_earliest_job_per_technician() {
        let jobs = jobs(vec![
            record(Some("5/5/2025"), "10:00 AM", "222222", "Brandon"),
            record(Some("5/5/2025"), "8:00 AM", "111111", "Brandon"),
        ]);
        let summary = build_first_job_summary(&jobs);
        let day = &summary[&NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()];
        assert_eq!(day.len(), 1);
        assert_eq!(
            day[0],
            "Brandon H - 8am - Smith - Install - 123 Main St - WO 111111"
        );
    }

    #[test]
    fn groups_by_date_and_sorts_by_time() {
        let jobs = jobs(vec![
            record(Some("5/6/2025"), "9 AM", "333333", "Jeff T"),
            record(Some("5/5/2025"), "2", "444444", "DJ"),
            record(Some("5/5/2025"), "8:30 AM", "555555", "Brandon"),
        ]);
        let summary = build_first_job_summary(&jobs);
        let dates: Vec<_> = summary.keys().copied().collect();
        assert_eq!(
            dates,
            vec![
                NaiveDate::from_ymd_opt(2025, 5, 5).unwrap(),
                NaiveDate::from_ymd_opt(2025, 5, 6).unwrap()
            ]
        );
        let first_day = &summary[&dates[0]];
        assert!(first_day[0].starts_with("Brandon H - 8:30am"));
        assert!(first_day[1].starts_with("Darnell J - 2pm"));
    }

    #[test]
    fn missing_date_defaults_to_tomorrow() {
        let report = normalize(
            vec![
                record(None, "8 AM", "111111", "Brandon"),
                record(Some("someday"), "8 AM", "222222", "Brandon"),
            ],
            today(),
            &ContractorDirectory::default(),
        );
        assert_eq!(report.defaulted_dates, 2);
        assert!(report.jobs.iter().all(|j| j.date == NaiveDate::from_ymd_opt(2025, 5, 5).unwrap()));
        assert!(report.jobs.iter().all(|j| j.date_defaulted));
    }

    #[test]
    fn unparseable_times_are_reported_and_left_out() {
        let report = normalize(
            vec![record(Some("5/5/2025"), "TBD", "111111", "Brandon")],
            today(),
            &ContractorDirectory::default(),
        );
        assert_eq!(report.unparseable_times.len(), 1);
        assert_eq!(report.unparseable_times[0].raw, "TBD");
        assert_eq!(report.jobs.len(), 1);
        assert!(build_first_job_summary(&report.jobs).is_empty());
    }

    #[test]
    fn records_without_technician_are_dropped() {
        let report = normalize(
            vec![record(Some("5/5/2025"), "8 AM", "111111", "  ")],
            today(),
            &ContractorDirectory::default(),
        );
        assert!(report.jobs.is_empty());
        assert_eq!(report.missing_technician.len(), 1);
    }

    #[test]
    fn technician_is_corrected_for_contractor() {
        let jobs = jobs(vec![record(Some("5/5/2025"), "8 AM", "111111", "jeff t")]);
        assert_eq!(jobs[0].technician, "Jeffery Thornton");
        assert_eq!(jobs[0].contractor_full_name, "Subterraneus Installs");
    }

    #[test]
    fn date_range_is_inclusive() {
        let all = jobs(vec![
            record(Some("5/4/2025"), "8 AM", "111111", "Brandon"),
            record(Some("5/5/2025"), "8 AM", "222222", "Brandon"),
            record(Some("5/6/2025"), "8 AM", "333333", "Brandon"),
        ]);
        let d = |day| NaiveDate::from_ymd_opt(2025, 5, day).unwrap();
        assert_eq!(available_dates(&all), vec![d(4), d(5), d(6)]);

        let kept = filter_by_date_range(all.clone(), Some(d(5)), Some(d(6)));
        assert_eq!(kept.len(), 2);
        assert_eq!(filter_by_date_range(all, None, Some(d(4))).len(), 1);
    }
}
