//! 0–100 string similarity used as the last-resort name matcher.

/// Normalized Levenshtein similarity on a 0–100 scale, ignoring case and
/// surrounding whitespace. Identical strings score 100; two empty strings
/// also score 100.
pub fn ratio(a: &str, b: &str) -> f64 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    strsim::normalized_levenshtein(&a, &b) * 100.0
}

/// Highest-scoring candidate and its score. Ties keep the earliest candidate.
pub fn best_match<'a, I>(needle: &str, candidates: I) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut best: Option<(&'a str, f64)> = None;
    for candidate in candidates {
        let score = ratio(needle, candidate);
        if best.map_or(true, |(_, s)| score > s) {
            best = Some((candidate, score));
        }
    }
    best
}

/// Best candidate scoring strictly above `floor`.
pub fn best_above<'a, I>(needle: &str, candidates: I, floor: f64) -> Option<(&'a str, f64)>
where
    I: IntoIterator<Item = &'a str>,
{
    best_match(needle, candidates).filter(|(_, score)| *score > floor)
}
