//! Config Validation Tests
//!
//! Typo detection on raw TOML, range validation of the tunables, and the
//! contractor table replacement rule, exercised through the public API.

use tech_dispatch::config::validation::{
    known_config_keys, suggest_correction, validate_unknown_keys,
};
use tech_dispatch::config::{ConfigError, ContractorDirectory, DispatchConfig};
use tech_dispatch::schedule::ParserId;

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_similarity_floor_warns_with_suggestion() {
    let toml_str = r#"
[matching]
similarity_flor = 92.0
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("similarity_flor"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("matching.similarity_floor")
    );
}

#[test]
fn typo_under_contractor_label_keeps_label() {
    let toml_str = r#"
[contractors.SubT]
ful_name = "Subterraneus Installs"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("contractors.SubT.full_name")
    );
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[run]
log_dir = "/var/log/dispatch"
digest = "html"

[matching]
similarity_floor = 92.0

[time]
force_pm_hours = [1, 2, 3, 4]

[portal]
verify_attempts = 5
retry_delay_secs = 2
assign_contractor = false

[contractors.SubT]
full_name = "Subterraneus Installs"
format = "tabbed_blocks"

[contractors.SubT.corrections]
"jeff t" = "Jeffery Thornton"

[default_corrections]
cliff = "Clifford Kunkle"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "Unexpected warnings: {:?}", warnings);
}

#[test]
fn unknown_section_is_reported() {
    let warnings = validate_unknown_keys("[browser]\nheadless = true\n");
    assert!(warnings.iter().any(|w| w.field == "browser"));
}

#[test]
fn garbage_key_gets_no_suggestion() {
    let known = known_config_keys();
    assert!(suggest_correction("zzzzzzzzzzzz", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

fn validation_errors(toml_str: &str) -> Vec<String> {
    match DispatchConfig::from_toml_str(toml_str) {
        Err(ConfigError::Validation(errors)) => errors,
        other => panic!("expected validation failure, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn similarity_floor_below_ninety_is_rejected() {
    let errors = validation_errors("[matching]\nsimilarity_floor = 85.0\n");
    assert!(errors.iter().any(|e| e.contains("similarity_floor")));
}

#[test]
fn force_pm_hours_must_be_clock_hours() {
    let errors = validation_errors("[time]\nforce_pm_hours = [1, 13]\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("13"));
}

#[test]
fn zero_verify_attempts_is_rejected() {
    let errors = validation_errors("[portal]\nverify_attempts = 0\n");
    assert!(errors.iter().any(|e| e.contains("verify_attempts")));
}

#[test]
fn empty_correction_target_is_rejected() {
    let errors = validation_errors("[default_corrections]\ncliff = \"\"\n");
    assert!(errors.iter().any(|e| e.contains("default_corrections.cliff")));
}

#[test]
fn multiple_problems_are_reported_together() {
    let errors = validation_errors(
        "[matching]\nsimilarity_floor = 50.0\n[portal]\nverify_attempts = 0\n",
    );
    assert_eq!(errors.len(), 2);
}

#[test]
fn bad_format_id_is_a_parse_error() {
    let result = DispatchConfig::from_toml_str(
        "[contractors.X]\nfull_name = \"X Corp\"\nformat = \"spreadsheet\"\n",
    );
    assert!(matches!(result, Err(ConfigError::Parse(..))));
}

// ============================================================================
// Contractor Tables
// ============================================================================

#[test]
fn defaults_cover_six_contractors() {
    let directory = ContractorDirectory::default();
    let labels: Vec<&str> = directory.profiles().map(|p| p.label.as_str()).collect();
    for label in ["SubT", "Tex-Star", "All-Clear", "Pifer", "TGS", "Advanced"] {
        assert!(labels.contains(&label), "missing {label}");
    }
    assert_eq!(directory.full_name("tgs"), Some("TAK Broadband"));
    assert_eq!(
        directory.profile("Pifer").and_then(|p| p.format),
        Some(ParserId::DayMonthRows)
    );
}

#[test]
fn declared_contractors_replace_builtins() {
    let config = DispatchConfig::from_toml_str(
        "[contractors.Acme]\nfull_name = \"Acme Fiber\"\nformat = \"legacy\"\n",
    )
    .unwrap();
    let directory = ContractorDirectory::from_config(&config);
    assert!(directory.profile("SubT").is_none());
    assert_eq!(directory.full_name("acme"), Some("Acme Fiber"));
    // default corrections survive
    assert!(directory.default_corrections().contains_key("cliff"));
}

#[test]
fn correction_keys_are_case_insensitive() {
    let config = DispatchConfig::from_toml_str(
        "[contractors.Acme]\nfull_name = \"Acme Fiber\"\n[contractors.Acme.corrections]\n\"Big D\" = \"Dwayne Smith\"\n",
    )
    .unwrap();
    let directory = ContractorDirectory::from_config(&config);
    let table = directory.corrections_for("acme fiber").unwrap();
    assert_eq!(table.get("big d").map(String::as_str), Some("Dwayne Smith"));
}

#[test]
fn load_from_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dispatch.toml");
    std::fs::write(&path, "[matching\n").unwrap();
    let err = DispatchConfig::load_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("dispatch.toml"));
}

#[test]
fn serialized_defaults_load_back() {
    let toml_str = DispatchConfig::default().to_toml().unwrap();
    let config = DispatchConfig::from_toml_str(&toml_str).unwrap();
    assert_eq!(config.contractors.len(), 6);
    assert!(validate_unknown_keys(&toml_str).is_empty());
}
