//! Config validation: unknown-key detection with edit-distance suggestions
//! and correction-table sanity checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization. Warnings never break existing configs.

use std::collections::HashSet;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, " (did you mean '{s}'?)")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the valid dotted key paths for DispatchConfig.
///
/// A `*` segment matches any single key (contractor labels, nicknames).
/// Any new field added to DispatchConfig must be added here too.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [run]
        "run",
        "run.log_dir",
        "run.digest",
        // [matching]
        "matching",
        "matching.similarity_floor",
        // [time]
        "time",
        "time.force_pm_hours",
        // [portal]
        "portal",
        "portal.verify_attempts",
        "portal.retry_delay_secs",
        "portal.assign_contractor",
        // [contractors.<label>]
        "contractors",
        "contractors.*",
        "contractors.*.full_name",
        "contractors.*.format",
        "contractors.*.corrections",
        "contractors.*.corrections.*",
        // [default_corrections]
        "default_corrections",
        "default_corrections.*",
    ];
    keys.iter().copied().collect()
}

fn key_matches(pattern: &str, key: &str) -> bool {
    let mut pattern_parts = pattern.split('.');
    let mut key_parts = key.split('.');
    loop {
        match (pattern_parts.next(), key_parts.next()) {
            (None, None) => return true,
            (Some("*"), Some(_)) => {}
            (Some(p), Some(k)) if p == k => {}
            _ => return false,
        }
    }
}

fn is_known(key: &str, known: &HashSet<&str>) -> bool {
    known.contains(key) || known.iter().any(|pattern| key_matches(pattern, key))
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
///
/// Keys containing dots (quoted TOML keys) would confuse the pattern
/// matcher, so their dots are replaced by spaces.
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let k = k.replace('.', " ");
            let path = if prefix.is_empty() {
                k
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

/// Suggest the closest concrete known key for an unknown key, if within
/// edit distance 3. Wildcard patterns are never suggested.
///
/// For keys under a wildcard section the wildcard segment is copied from the
/// unknown key, so `contractors.SubT.ful_name` suggests
/// `contractors.SubT.full_name`.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(String, usize)> = None;
    let unknown_parts: Vec<&str> = unknown.split('.').collect();

    for &k in known {
        let pattern_parts: Vec<&str> = k.split('.').collect();
        if pattern_parts.len() != unknown_parts.len() {
            continue;
        }
        if pattern_parts.last() == Some(&"*") {
            continue;
        }
        let candidate = pattern_parts
            .iter()
            .zip(&unknown_parts)
            .map(|(p, u)| if *p == "*" { *u } else { *p })
            .collect::<Vec<_>>()
            .join(".");

        let dist = strsim::levenshtein(unknown, &candidate);
        if dist <= 3 && best.as_ref().map_or(true, |(_, best_dist)| dist < *best_dist) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(k, _)| k)
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys, it only warns. Existing configs
/// always continue to work.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    let mut warnings = Vec::new();

    for key in walk_toml_keys(&value, "") {
        if !is_known(&key, &known) {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            warnings.push(ValidationWarning {
                field: key,
                message,
                suggestion,
            });
        }
    }

    warnings
}

// ============================================================================
// Correction Table Checks
// ============================================================================

/// Flag correction entries that can never help a match.
///
/// - default-table keys with a space are never consulted (lookup is by first word)
/// - single-word targets cannot satisfy the first-name + last-initial tier
pub fn validate_correction_tables(config: &super::DispatchConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for (key, full) in &config.default_corrections {
        if key.trim().contains(char::is_whitespace) {
            warnings.push(ValidationWarning {
                field: format!("default_corrections.{key}"),
                message: format!(
                    "default_corrections key '{key}' has a space; \
                     the default table is keyed by first name only"
                ),
                suggestion: key.split_whitespace().next().map(str::to_lowercase),
            });
        }
        if full.split_whitespace().count() < 2 {
            warnings.push(single_word_target(&format!("default_corrections.{key}"), full));
        }
    }

    for (label, profile) in &config.contractors {
        for (key, full) in &profile.corrections {
            if full.split_whitespace().count() < 2 {
                warnings.push(single_word_target(
                    &format!("contractors.{label}.corrections.{key}"),
                    full,
                ));
            }
        }
    }

    warnings
}

fn single_word_target(field: &str, full: &str) -> ValidationWarning {
    ValidationWarning {
        field: field.to_string(),
        message: format!("{field} = '{full}' is a single word; dropdown options are full names"),
        suggestion: None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [contractors.SubT]
            full_name = "Subterraneus Installs"
            [contractors.SubT.corrections]
            "jeff t" = "Jeffery Thornton"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"contractors".to_string()));
        assert!(keys.contains(&"contractors.SubT".to_string()));
        assert!(keys.contains(&"contractors.SubT.corrections.jeff t".to_string()));
    }

    #[test]
    fn test_wildcard_matching() {
        assert!(key_matches("contractors.*.full_name", "contractors.TGS.full_name"));
        assert!(!key_matches("contractors.*.full_name", "contractors.TGS"));
        assert!(!key_matches("contractors.*", "contractors.TGS.full_name"));
    }

    #[test]
    fn test_typo_key_produces_warning_with_suggestion() {
        let toml_str = r#"
[matching]
similarity_flor = 92.0
"#;
        let warnings = validate_unknown_keys(toml_str);
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings[0].suggestion.as_deref(),
            Some("matching.similarity_floor")
        );
    }

    #[test]
    fn test_typo_under_wildcard_keeps_label() {
        let known = known_config_keys();
        assert_eq!(
            suggest_correction("contractors.SubT.ful_name", &known).as_deref(),
            Some("contractors.SubT.full_name")
        );
    }

    #[test]
    fn test_suggest_correction_no_match_for_garbage() {
        let known = known_config_keys();
        assert!(suggest_correction("completely_unrelated_garbage_key_xyz", &known).is_none());
    }

    #[test]
    fn test_nicknames_never_warn() {
        let toml_str = r#"
[default_corrections]
cliff = "Clifford Kunkle"
"big.mike" = "Michael Stone"
"#;
        assert!(validate_unknown_keys(toml_str).is_empty());
    }

    #[test]
    fn test_default_key_with_space_warns() {
        let mut config = crate::config::DispatchConfig::default();
        config
            .default_corrections
            .insert("jeff t".to_string(), "Jeffery Thornton".to_string());
        let warnings = validate_correction_tables(&config);
        assert!(warnings.iter().any(|w| w.field == "default_corrections.jeff t"));
        assert_eq!(
            warnings
                .iter()
                .find(|w| w.field == "default_corrections.jeff t")
                .and_then(|w| w.suggestion.as_deref()),
            Some("jeff")
        );
    }

    #[test]
    fn test_defaults_are_clean() {
        let config = crate::config::DispatchConfig::default();
        assert!(validate_correction_tables(&config).is_empty());
    }
}
