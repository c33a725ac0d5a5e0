//! Technician name correction: casual schedule token → most likely full name.

use tracing::debug;

use super::similarity::best_above;
use crate::config::ContractorDirectory;

/// Lookup key for a raw token: lowercase, `first` for one word and
/// `first l` (second word's initial) for two or more.
pub fn name_key(raw: &str) -> String {
    let words: Vec<String> = raw.split_whitespace().map(str::to_lowercase).collect();
    match words.as_slice() {
        [] => String::new(),
        [only] => only.clone(),
        [first, second, ..] => match second.chars().next() {
            Some(initial) => format!("{first} {initial}"),
            None => first.clone(),
        },
    }
}

/// Resolve a raw technician token for a contractor company.
///
/// Tries, first hit wins:
/// 1. the contractor table by full key
/// 2. the contractor table by first word, when the key has two words
/// 3. the best contractor-table key scoring above the similarity floor
///    against the first word
/// 4. the default table by first word
///
/// Falls back to the trimmed input; never fails.
pub fn correct_name(
    raw: &str,
    contractor_full_name: &str,
    directory: &ContractorDirectory,
) -> String {
    let key = name_key(raw);
    if key.is_empty() {
        return raw.trim().to_string();
    }
    let first = key.split(' ').next().unwrap_or(&key);

    if let Some(table) = directory.corrections_for(contractor_full_name) {
        if let Some(full) = table.get(&key) {
            debug!(raw, key = %key, full = %full, "name corrected from contractor table");
            return full.clone();
        }

        if key.contains(' ') {
            if let Some(full) = table.get(first) {
                debug!(raw, key = first, full = %full, "name corrected by first word");
                return full.clone();
            }
        }

        // Sorted so equal scores resolve the same way every run
        let mut keys: Vec<&str> = table.keys().map(String::as_str).collect();
        keys.sort_unstable();
        if let Some((hit, score)) = best_above(first, keys, directory.similarity_floor()) {
            if let Some(full) = table.get(hit) {
                debug!(raw, key = hit, score, full = %full, "name corrected by similarity");
                return full.clone();
            }
        }
    }

    if let Some(full) = directory.default_corrections().get(first) {
        debug!(raw, key = first, full = %full, "name corrected from default table");
        return full.clone();
    }

    raw.trim().to_string()
}

/// `brandon hale` → `Brandon H`; a single word is just capitalized.
pub fn display_name(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let Some(first) = words.first() else {
        return String::new();
    };
    let mut chars = first.chars();
    let mut out: String = chars
        .next()
        .map(|c| c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
        .unwrap_or_default();
    if let Some(initial) = words.get(1..).and_then(<[&str]>::last).and_then(|w| w.chars().next()) {
        out.push(' ');
        out.extend(initial.to_uppercase());
    }
    out
}
