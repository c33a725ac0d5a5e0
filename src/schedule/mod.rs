//! Schedule parsing: pasted contractor text → [`JobRecord`]s.
//!
//! Every dialect parser is a pure `fn(&[&str]) -> ParseOutput`. Lines that
//! fit no grammar become [`SkippedLine`] values with a reason and are logged
//! with a `SKIP` prefix; parsers never fail as a whole and keep input order.
//!
//! ## Dialects
//!
//! | Id | Shape |
//! |----|-------|
//! | `tabbed_blocks` | date / time / tab-separated detail blocks |
//! | `header_inline` | all-caps technician, date and time headers over dash job lines |
//! | `dash_underscore` | one job per line, `-` or `_` delimited |
//! | `tabular_city` | fixed columns including city, 8+ fields |
//! | `grouped_technician` | technician name + date header pairs over time-led jobs |
//! | `day_month_rows` | tab rows opening with `21-Apr` |
//! | `legacy` | dash splitting, last resort |

pub mod dash_underscore;
pub mod day_month_rows;
pub mod dispatcher;
pub mod grammar;
pub mod grouped_technician;
pub mod header_inline;
pub mod legacy;
pub mod tabbed_blocks;
pub mod tabular_city;
pub mod timefmt;
pub mod types;

pub use dispatcher::{detect_format, dispatch, Dispatched, ParseFn, ParserId};
pub use timefmt::{
    parse_date, parse_time, parse_time_with, DateParseError, ForcePmPolicy, TimeParseError,
};
pub use types::{JobRecord, ParseOutput, ParseSkipReason, SkippedLine, WorkOrderId};
