//! System-wide default constants.
//!
//! Centralises the magic numbers the parsers, matcher and assignment loop
//! rely on. Grouped by subsystem for easy discovery.

// ============================================================================
// Config Discovery
// ============================================================================

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "DISPATCH_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "dispatch.toml";

/// Directory receiving one `Output<MMDDHHMM>.txt` log per run.
pub const LOG_DIR: &str = "logs";

// ============================================================================
// Time Normalization
// ============================================================================

/// Bare hours read as PM when typed without AM/PM.
pub const FORCE_PM_HOURS: [u32; 5] = [1, 2, 3, 4, 5];

// ============================================================================
// Name Matching
// ============================================================================

/// Fuzzy matches must score strictly above this (0–100 scale).
///
/// Lower values let typos through as wrong-technician assignments, so
/// validation refuses anything below it.
pub const SIMILARITY_FLOOR: f64 = 90.0;

// ============================================================================
// Format Detection
// ============================================================================

/// Non-blank lines inspected when sniffing a paste's dialect.
pub const SNIFF_PREFIX_LINES: usize = 5;

/// Minimum fields for a tabular-with-city row.
pub const TABULAR_MIN_FIELDS: usize = 8;

// ============================================================================
// Work Order Portal
// ============================================================================

/// Attempts to open and verify a work order page before skipping it.
pub const VERIFY_ATTEMPTS: u32 = 3;

/// Fixed sleep between verification attempts (seconds).
pub const RETRY_DELAY_SECS: u64 = 5;
