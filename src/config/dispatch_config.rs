//! Dispatch Configuration - contractors, correction tables and tunables as TOML
//!
//! Every contractor label, nickname table and matching threshold lives here.
//! `Default` reproduces the built-in contractor set, so a missing config file
//! changes nothing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::schedule::ParserId;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for a dispatch run.
///
/// Load with `DispatchConfig::load()` which searches:
/// 1. `$DISPATCH_CONFIG` env var
/// 2. `./dispatch.toml`
/// 3. Built-in defaults
///
/// A file that declares any `[contractors.*]` table replaces the built-in
/// contractor set rather than merging with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    #[serde(default)]
    pub run: RunConfig,

    #[serde(default)]
    pub matching: MatchingConfig,

    #[serde(default)]
    pub time: TimeConfig,

    #[serde(default)]
    pub portal: PortalConfig,

    /// Contractor label → profile
    #[serde(default = "default_contractors")]
    pub contractors: BTreeMap<String, ContractorConfig>,

    /// First-word nickname → full name, consulted after the contractor table
    #[serde(default = "default_corrections")]
    pub default_corrections: BTreeMap<String, String>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            matching: MatchingConfig::default(),
            time: TimeConfig::default(),
            portal: PortalConfig::default(),
            contractors: default_contractors(),
            default_corrections: default_corrections(),
        }
    }
}

impl DispatchConfig {
    /// Load configuration using the standard search order:
    /// 1. `$DISPATCH_CONFIG` environment variable
    /// 2. `./dispatch.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(defaults::CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(
                            path = %p.display(),
                            contractors = config.contractors.len(),
                            "Loaded dispatch config from {}",
                            defaults::CONFIG_ENV_VAR
                        );
                        return config;
                    }
                    Err(e) => {
                        warn!(
                            path = %p.display(),
                            error = %e,
                            "Failed to load config from {}, falling back",
                            defaults::CONFIG_ENV_VAR
                        );
                    }
                }
            } else {
                warn!(
                    path = %path,
                    "{} points to non-existent file, falling back",
                    defaults::CONFIG_ENV_VAR
                );
            }
        }

        let local = PathBuf::from(defaults::LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(
                        contractors = config.contractors.len(),
                        "Loaded dispatch config from ./{}",
                        defaults::LOCAL_CONFIG_FILE
                    );
                    return config;
                }
                Err(e) => {
                    warn!(
                        error = %e,
                        "Failed to load ./{}, using defaults",
                        defaults::LOCAL_CONFIG_FILE
                    );
                }
            }
        }

        info!("No {} found, using built-in contractor set", defaults::LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    ///
    /// Unknown keys are reported as warnings before deserialization so a
    /// typo never silently falls back to a default.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        for w in super::validation::validate_correction_tables(&config) {
            warn!("{}", w);
        }
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate thresholds and contractor tables.
    ///
    /// Rules:
    /// - Similarity floor within 90..=100
    /// - Force-PM hours within 1..=11
    /// - At least one verification attempt
    /// - Every contractor has a full name; labels unique ignoring case
    /// - No empty correction targets
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        let floor = self.matching.similarity_floor;
        if !floor.is_finite() || !(defaults::SIMILARITY_FLOOR..=100.0).contains(&floor) {
            errors.push(format!(
                "matching.similarity_floor ({floor}) must be within {}..=100",
                defaults::SIMILARITY_FLOOR
            ));
        }

        for hour in &self.time.force_pm_hours {
            if !(1..=11).contains(hour) {
                errors.push(format!("time.force_pm_hours: {hour} is not an hour in 1..=11"));
            }
        }

        if self.portal.verify_attempts == 0 {
            errors.push("portal.verify_attempts must be at least 1".to_string());
        }

        let mut seen_labels: BTreeMap<String, &str> = BTreeMap::new();
        for (label, profile) in &self.contractors {
            if label.trim().is_empty() {
                errors.push("contractors: empty label".to_string());
            }
            if profile.full_name.trim().is_empty() {
                errors.push(format!("contractors.{label}.full_name must not be empty"));
            }
            if let Some(previous) = seen_labels.insert(label.to_lowercase(), label) {
                errors.push(format!(
                    "contractors: '{label}' duplicates '{previous}' ignoring case"
                ));
            }
            Self::check_corrections(
                &profile.corrections,
                &format!("contractors.{label}.corrections"),
                &mut errors,
            );
        }
        Self::check_corrections(&self.default_corrections, "default_corrections", &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_corrections(table: &BTreeMap<String, String>, name: &str, errors: &mut Vec<String>) {
        for (nickname, full) in table {
            if nickname.trim().is_empty() {
                errors.push(format!("{name}: empty nickname key"));
            }
            if full.trim().is_empty() {
                errors.push(format!("{name}.{nickname}: full name must not be empty"));
            }
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {1}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {1}", .0.display())]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Sections
// ============================================================================

/// Where the run writes its log and which digest flavour it prints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_log_dir")]
    pub log_dir: PathBuf,

    #[serde(default)]
    pub digest: DigestFormat,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from(defaults::LOG_DIR)
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            log_dir: default_log_dir(),
            digest: DigestFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DigestFormat {
    #[default]
    Plain,
    Html,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Fuzzy matches must score strictly above this
    #[serde(default = "default_similarity_floor")]
    pub similarity_floor: f64,
}

fn default_similarity_floor() -> f64 {
    defaults::SIMILARITY_FLOOR
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_floor: default_similarity_floor(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    /// Bare hours read as PM when typed without AM/PM
    #[serde(default = "default_force_pm_hours")]
    pub force_pm_hours: Vec<u32>,
}

fn default_force_pm_hours() -> Vec<u32> {
    defaults::FORCE_PM_HOURS.to_vec()
}

impl Default for TimeConfig {
    fn default() -> Self {
        Self {
            force_pm_hours: default_force_pm_hours(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_verify_attempts")]
    pub verify_attempts: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_secs: u64,

    /// Set the contractor company on the work order before picking a technician
    #[serde(default = "default_true")]
    pub assign_contractor: bool,
}

fn default_verify_attempts() -> u32 {
    defaults::VERIFY_ATTEMPTS
}
fn default_retry_delay() -> u64 {
    defaults::RETRY_DELAY_SECS
}
fn default_true() -> bool {
    true
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            verify_attempts: default_verify_attempts(),
            retry_delay_secs: default_retry_delay(),
            assign_contractor: default_true(),
        }
    }
}

/// One contractor company as the operator knows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractorConfig {
    /// Company name as the ticketing system spells it
    pub full_name: String,

    /// Dedicated paste dialect; sniffed when absent
    #[serde(default)]
    pub format: Option<ParserId>,

    /// Lowercase nickname key (`first` or `first l`) → full name
    #[serde(default)]
    pub corrections: BTreeMap<String, String>,
}

// ============================================================================
// Built-in Contractor Set
// ============================================================================

fn table(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn contractor(full_name: &str, format: ParserId, corrections: &[(&str, &str)]) -> ContractorConfig {
    ContractorConfig {
        full_name: full_name.to_string(),
        format: Some(format),
        corrections: table(corrections),
    }
}

fn default_contractors() -> BTreeMap<String, ContractorConfig> {
    let mut contractors = BTreeMap::new();
    contractors.insert(
        "SubT".to_string(),
        contractor(
            "Subterraneus Installs",
            ParserId::TabbedBlocks,
            &[
                ("jeff t", "Jeffery Thornton"),
                ("christopher k", "Chris Kunkle"),
                ("brandon", "Brandon Hale"),
                ("dj", "Darnell Jackson"),
            ],
        ),
    );
    contractors.insert(
        "Tex-Star".to_string(),
        contractor(
            "Tex-Star Communications",
            ParserId::TabularCity,
            &[("doug", "Douglas Gale"), ("shane", "Shane Hagins")],
        ),
    );
    contractors.insert(
        "All-Clear".to_string(),
        contractor(
            "All Clear Missouri",
            ParserId::DashUnderscore,
            &[("carrie", "Carrie Mason"), ("shawn m", "Shawn Miller")],
        ),
    );
    contractors.insert(
        "Pifer".to_string(),
        contractor(
            "Pifer Communications",
            ParserId::DayMonthRows,
            &[("caleb", "Caleb Pifer")],
        ),
    );
    contractors.insert(
        "TGS".to_string(),
        contractor(
            "TAK Broadband",
            ParserId::HeaderInline,
            &[("emily", "Emily Moody"), ("chris m", "Chris Moore")],
        ),
    );
    contractors.insert(
        "Advanced".to_string(),
        contractor(
            "Advanced Lighting & Electric",
            ParserId::GroupedTechnician,
            &[("bd", "Brian Murphy"), ("kev", "Kevin Murphy")],
        ),
    );
    contractors
}

fn default_corrections() -> BTreeMap<String, String> {
    table(&[
        ("cliff", "Clifford Kunkle"),
        ("simmie", "Simmie Dunn"),
        ("will", "William Woods"),
        ("nick", "Nick Prichett"),
        ("kyle", "Kyle Thatcher"),
        ("blake", "Blake Wellman"),
        ("jacob", "Jacob Jones"),
        ("adam", "Adam Ward"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        DispatchConfig::default().validate().unwrap();
    }

    #[test]
    fn builtin_set_has_six_contractors_with_formats() {
        let config = DispatchConfig::default();
        assert_eq!(config.contractors.len(), 6);
        assert!(config.contractors.values().all(|c| c.format.is_some()));
    }

    #[test]
    fn low_similarity_floor_is_rejected() {
        let mut config = DispatchConfig::default();
        config.matching.similarity_floor = 75.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("similarity_floor"));
    }

    #[test]
    fn force_pm_hour_out_of_range_is_rejected() {
        let mut config = DispatchConfig::default();
        config.time.force_pm_hours = vec![2, 13];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("13"));
    }

    #[test]
    fn zero_attempts_rejected() {
        let mut config = DispatchConfig::default();
        config.portal.verify_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn duplicate_labels_ignoring_case_rejected() {
        let mut config = DispatchConfig::default();
        let subt = config.contractors["SubT"].clone();
        config.contractors.insert("SUBT".to_string(), subt);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicates"));
    }

    #[test]
    fn toml_round_trip_keeps_contractors() {
        let config = DispatchConfig::default();
        let text = config.to_toml().unwrap();
        let back = DispatchConfig::from_toml_str(&text).unwrap();
        assert_eq!(back.contractors.len(), config.contractors.len());
        assert_eq!(back.contractors["TGS"].format, Some(ParserId::HeaderInline));
    }
}
