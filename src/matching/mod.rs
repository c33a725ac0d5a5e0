//! Technician name resolution.
//!
//! Two stages: [`correct_name`] maps a nickname or initials to the most
//! likely full name using the contractor's correction table, then
//! [`match_dropdown_option`] finds that name among the options the work
//! order form currently offers.

pub mod dropdown;
pub mod names;
pub mod similarity;

pub use dropdown::{match_dropdown_option, MatchOutcome, MatchTier};
pub use names::{correct_name, display_name, name_key};
pub use similarity::ratio;
