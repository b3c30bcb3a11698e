//! Metavariable Scanning and Substitution
//!
//! Executors link to each other through named placeholders written as
//! `$$name` inside command tokens and stdin/stdout/stderr templates:
//! - Detects which names a piece of text references
//! - Rewrites references with concrete values for the dispatcher

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Pattern matching a single `$$name` reference.
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\$([a-zA-Z][a-zA-Z0-9_]+)").expect("reference pattern is valid"));

/// Pattern a declared yield/input/output name must match in full.
static NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]+$").expect("name pattern is valid"));

/// Extracts the distinct metavariable names referenced in `text`.
///
/// # Example
/// ```
/// use tesflow::workflow::metavars::scan;
///
/// let names = scan("cat $$reads $$reads > $$merged");
/// assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["merged", "reads"]);
/// ```
pub fn scan(text: &str) -> BTreeSet<String> {
    REFERENCE
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Checks if a string contains at least one metavariable reference.
pub fn has_references(text: &str) -> bool {
    REFERENCE.is_match(text)
}

/// Checks if `name` could be referenced as `$$name`.
pub fn is_valid_name(name: &str) -> bool {
    NAME.is_match(name)
}

/// Replaces every reference whose name is present in `values`.
///
/// References without a value are left untouched, so partially resolved
/// templates can be rendered and filled in later.
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use tesflow::workflow::metavars::substitute;
///
/// let mut values = HashMap::new();
/// values.insert("reads".to_string(), "/data/r1.fq".to_string());
/// assert_eq!(substitute("wc -l $$reads $$other", &values), "wc -l /data/r1.fq $$other");
/// ```
pub fn substitute(text: &str, values: &HashMap<String, String>) -> String {
    REFERENCE
        .replace_all(text, |caps: &Captures| match values.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_scan_distinct_names() {
        let names = scan("$$a_1 and $$bb then $$a_1 again");
        assert_eq!(names.len(), 2);
        assert!(names.contains("a_1"));
        assert!(names.contains("bb"));
        assert!(!names.contains("and"));
    }

    #[test]
    fn test_scan_no_matches() {
        assert!(scan("echo hello").is_empty());
        assert!(scan("").is_empty());
        // single dollar is not a reference
        assert!(scan("$HOME $greeting").is_empty());
    }

    #[test]
    fn test_scan_requires_two_character_names() {
        // a single character does not satisfy [a-zA-Z][a-zA-Z0-9_]+
        assert!(scan("$$x").is_empty());
        assert_eq!(scan("$$xy").into_iter().collect::<Vec<_>>(), vec!["xy"]);
    }

    #[test]
    fn test_scan_name_must_start_with_letter() {
        assert!(scan("$$1abc").is_empty());
        assert_eq!(scan("$$_ab $$ab_").into_iter().collect::<Vec<_>>(), vec!["ab_"]);
    }

    #[test]
    fn test_scan_embedded_in_path() {
        let names = scan("/tmp/$$sample.bam");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["sample"]);
    }

    #[test]
    fn test_substitute_known_names() {
        let result = substitute("cp $$src $$dst", &values(&[("src", "a.txt"), ("dst", "b.txt")]));
        assert_eq!(result, "cp a.txt b.txt");
    }

    #[test]
    fn test_substitute_leaves_unknown_untouched() {
        let result = substitute("cp $$src $$dst", &values(&[("src", "a.txt")]));
        assert_eq!(result, "cp a.txt $$dst");
        assert_eq!(scan(&result).into_iter().collect::<Vec<_>>(), vec!["dst"]);
    }

    #[test]
    fn test_substitute_full_context_clears_references() {
        let text = "join $$left $$right > $$joined";
        let full = values(&[("left", "l"), ("right", "r"), ("joined", "j")]);
        assert!(scan(&substitute(text, &full)).is_empty());
    }

    #[test]
    fn test_substitute_every_occurrence() {
        let result = substitute("$$ab-$$ab-$$ab", &values(&[("ab", "z")]));
        assert_eq!(result, "z-z-z");
    }

    #[test]
    fn test_has_references() {
        assert!(has_references("echo $$greeting"));
        assert!(!has_references("echo greeting"));
    }

    #[test]
    fn test_is_valid_name() {
        assert!(is_valid_name("out1"));
        assert!(is_valid_name("sample_bam"));
        assert!(!is_valid_name("x"));
        assert!(!is_valid_name("1out"));
        assert!(!is_valid_name("out-1"));
        assert!(!is_valid_name(""));
    }
}
