//! Match a technician token against the live dropdown options of a work order.
//!
//! Options are authoritative full names; the token is whatever the contractor
//! typed. Strategies run from strict to permissive and the first success
//! wins. A wrong assignment is worse than none, so ambiguity and weak fuzzy
//! scores both end in no match.

use std::fmt;

use super::names::correct_name;
use super::similarity::best_above;
use crate::config::ContractorDirectory;

/// Which strategy produced a match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchTier {
    /// The raw token already equals an option.
    Raw,
    /// The corrected name equals an option.
    Exact,
    /// First-name prefix plus matching last initial.
    PrefixInitial,
    /// The only option whose first name starts with the corrected first name.
    UniquePrefix,
    /// Best similarity above the floor.
    Fuzzy { score: f64 },
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("raw"),
            Self::Exact => f.write_str("exact"),
            Self::PrefixInitial => f.write_str("prefix+initial"),
            Self::UniquePrefix => f.write_str("unique prefix"),
            Self::Fuzzy { score } => write!(f, "fuzzy {score:.1}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MatchOutcome {
    Matched { option: String, tier: MatchTier },
    /// Several options share the first-name prefix.
    Ambiguous { corrected: String, candidates: Vec<String> },
    NoMatch { corrected: String },
}

impl MatchOutcome {
    pub fn option(&self) -> Option<&str> {
        match self {
            Self::Matched { option, .. } => Some(option),
            _ => None,
        }
    }
}

/// Resolve `raw` against `options` for a contractor company.
pub fn match_dropdown_option(
    options: &[String],
    raw: &str,
    contractor_full_name: &str,
    directory: &ContractorDirectory,
) -> MatchOutcome {
    let raw = raw.trim();
    if raw.is_empty() {
        return MatchOutcome::NoMatch {
            corrected: String::new(),
        };
    }

    if let Some(option) = find_exact(options, raw) {
        return matched(option, MatchTier::Raw);
    }

    let corrected = correct_name(raw, contractor_full_name, directory);
    if let Some(option) = find_exact(options, &corrected) {
        return matched(option, MatchTier::Exact);
    }

    let lowered = corrected.to_lowercase();
    let mut words = lowered.split_whitespace();
    let first = words.next().unwrap_or_default();
    let initial = words.next().and_then(|w| w.chars().next());

    if let Some(initial) = initial {
        let hit = options.iter().find(|option| {
            let mut parts = option.split_whitespace().map(str::to_lowercase);
            let option_first = parts.next().unwrap_or_default();
            let option_initial = parts.next().and_then(|w| w.chars().next());
            option_first.starts_with(first) && option_initial == Some(initial)
        });
        if let Some(option) = hit {
            return matched(option, MatchTier::PrefixInitial);
        }
    }

    let prefixed: Vec<&String> = options
        .iter()
        .filter(|option| {
            option
                .split_whitespace()
                .next()
                .is_some_and(|w| w.to_lowercase().starts_with(first))
        })
        .collect();
    match prefixed.as_slice() {
        [only] => return matched(only, MatchTier::UniquePrefix),
        [] => {}
        many => {
            return MatchOutcome::Ambiguous {
                corrected,
                candidates: many.iter().map(|s| (*s).clone()).collect(),
            }
        }
    }

    let floor = directory.similarity_floor();
    match best_above(&corrected, options.iter().map(String::as_str), floor) {
        Some((option, score)) => matched(option, MatchTier::Fuzzy { score }),
        None => MatchOutcome::NoMatch { corrected },
    }
}

fn find_exact<'a>(options: &'a [String], name: &str) -> Option<&'a String> {
    let wanted = name.trim().to_lowercase();
    options.iter().find(|o| o.trim().to_lowercase() == wanted)
}

fn matched(option: &str, tier: MatchTier) -> MatchOutcome {
    MatchOutcome::Matched {
        option: option.to_string(),
        tier,
    }
}
