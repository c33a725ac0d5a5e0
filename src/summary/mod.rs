//! Job assembly and the daily first-job digest.

pub mod assembler;
pub mod render;

pub use assembler::{
    available_dates, build_first_job_summary, filter_by_date_range, normalize, NormalizeReport,
    ScheduledJob, UnparseableTime,
};
pub use render::{day_heading, render_html, render_plain};
