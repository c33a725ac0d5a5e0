//! Immutable contractor lookup built once per run from [`DispatchConfig`].
//!
//! Parsers, the matcher and the assignment loop all receive a
//! `&ContractorDirectory`; nothing reads contractor data from global state.

use std::collections::{BTreeMap, HashMap};

use super::DispatchConfig;
use crate::schedule::timefmt::ForcePmPolicy;
use crate::schedule::ParserId;

/// One contractor company with its nickname table.
#[derive(Debug, Clone)]
pub struct ContractorProfile {
    pub label: String,
    pub full_name: String,
    pub format: Option<ParserId>,
    corrections: HashMap<String, String>,
}

impl ContractorProfile {
    /// Lowercase nickname key → full name.
    pub fn corrections(&self) -> &HashMap<String, String> {
        &self.corrections
    }
}

#[derive(Debug, Clone)]
pub struct ContractorDirectory {
    /// Keyed by lowercase label
    profiles: BTreeMap<String, ContractorProfile>,
    default_corrections: HashMap<String, String>,
    similarity_floor: f64,
    force_pm: ForcePmPolicy,
}

impl ContractorDirectory {
    pub fn from_config(config: &DispatchConfig) -> Self {
        let profiles = config
            .contractors
            .iter()
            .map(|(label, c)| {
                let profile = ContractorProfile {
                    label: label.clone(),
                    full_name: c.full_name.trim().to_string(),
                    format: c.format,
                    corrections: lowercase_keys(&c.corrections),
                };
                (label.to_lowercase(), profile)
            })
            .collect();

        Self {
            profiles,
            default_corrections: lowercase_keys(&config.default_corrections),
            similarity_floor: config.matching.similarity_floor,
            force_pm: ForcePmPolicy::new(config.time.force_pm_hours.iter().copied()),
        }
    }

    /// Look up a contractor by operator label, ignoring case.
    pub fn profile(&self, label: &str) -> Option<&ContractorProfile> {
        self.profiles.get(&label.trim().to_lowercase())
    }

    /// Look up a contractor by the company name the ticketing system uses.
    pub fn by_full_name(&self, full_name: &str) -> Option<&ContractorProfile> {
        let wanted = full_name.trim();
        self.profiles
            .values()
            .find(|p| p.full_name.eq_ignore_ascii_case(wanted))
    }

    /// Map an operator label to the company's full name.
    pub fn full_name(&self, label: &str) -> Option<&str> {
        self.profile(label).map(|p| p.full_name.as_str())
    }

    /// Correction table for a company, empty when the company is unknown.
    pub fn corrections_for(&self, full_name: &str) -> Option<&HashMap<String, String>> {
        self.by_full_name(full_name).map(ContractorProfile::corrections)
    }

    /// Global first-word fallback table.
    pub fn default_corrections(&self) -> &HashMap<String, String> {
        &self.default_corrections
    }

    pub fn similarity_floor(&self) -> f64 {
        self.similarity_floor
    }

    pub fn force_pm(&self) -> &ForcePmPolicy {
        &self.force_pm
    }

    /// Profiles in label order.
    pub fn profiles(&self) -> impl Iterator<Item = &ContractorProfile> {
        self.profiles.values()
    }
}

impl Default for ContractorDirectory {
    fn default() -> Self {
        Self::from_config(&DispatchConfig::default())
    }
}

fn lowercase_keys(table: &BTreeMap<String, String>) -> HashMap<String, String> {
    table
        .iter()
        .map(|(k, v)| (normalize_key_spacing(k), v.trim().to_string()))
        .collect()
}

fn normalize_key_spacing(key: &str) -> String {
    key.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
