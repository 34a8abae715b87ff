use crate::replacements::ReplacementMap;

/// Replaces every occurrence of every map key in `text`.
///
/// Keys are applied one at a time from longest to shortest, so a key that is
/// a substring of a longer key can never split the longer match. Each key is
/// a single left-to-right pass over the accumulated result; a replacement is
/// not re-scanned by the key that produced it. Empty keys or values are
/// ignored.
pub fn apply_substitutions(text: &str, map: &ReplacementMap) -> String {
    let mut result = text.to_string();
    for (literal, replacement) in map.longest_first() {
        if literal.is_empty() || replacement.is_empty() {
            continue;
        }
        if result.contains(literal) {
            result = result.replace(literal, replacement);
        }
    }
    result
}

/// Counts the replacements [`apply_substitutions`] would make.
pub fn count_occurrences(text: &str, map: &ReplacementMap) -> usize {
    let mut result = text.to_string();
    let mut count = 0;
    for (literal, replacement) in map.longest_first() {
        if literal.is_empty() || replacement.is_empty() {
            continue;
        }
        let hits = result.matches(literal).count();
        if hits > 0 {
            count += hits;
            result = result.replace(literal, replacement);
        }
    }
    count
}
