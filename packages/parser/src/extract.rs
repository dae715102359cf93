//! Priority-ordered pattern matching for a single field.

use regex::Regex;

use crate::normalize::truncate_at_labels;
use crate::table::FieldPatterns;

/// Tries each pattern in order and returns the first non-blank capture.
///
/// Only the first acceptable match of each pattern is considered: if its
/// first capture group is empty or `-`, extraction moves on to the next
/// pattern. Matches that start right after one of `not_after` are skipped
/// in favour of the pattern's next match.
#[must_use]
pub fn extract_field(text: &str, patterns: &[Regex], not_after: &[String]) -> Option<String> {
    for re in patterns {
        let Some(caps) = re.captures_iter(text).find(|caps| {
            caps.get(0)
                .is_some_and(|m| !preceded_by_any(text, m.start(), not_after))
        }) else {
            continue;
        };

        let value = caps.get(1).map_or("", |m| m.as_str().trim());
        if !value.is_empty() && value != "-" {
            return Some(value.to_owned());
        }
    }

    None
}

/// Extracts and cleans the value for `field`.
#[must_use]
pub fn extract_clean(text: &str, field: &FieldPatterns) -> Option<String> {
    let raw = extract_field(text, &field.patterns, &field.not_after)?;
    let truncated = truncate_at_labels(&raw, &field.truncate_at);
    let cleaned = field.normalize.apply(&truncated);

    match &cleaned {
        Some(value) => log::trace!("{}: {raw:?} -> {value:?}", field.key),
        None => log::debug!("{}: discarded capture {raw:?}", field.key),
    }

    cleaned
}

/// Returns `true` if `text[..pos]` ends with any of `prefixes`, ignoring
/// ASCII case.
fn preceded_by_any(text: &str, pos: usize, prefixes: &[String]) -> bool {
    let before = &text[..pos];
    prefixes.iter().any(|prefix| {
        before.len() >= prefix.len()
            && before.is_char_boundary(before.len() - prefix.len())
            && before[before.len() - prefix.len()..].eq_ignore_ascii_case(prefix)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(patterns: &[&str]) -> Vec<Regex> {
        patterns
            .iter()
            .map(|p| {
                regex::RegexBuilder::new(p)
                    .case_insensitive(true)
                    .multi_line(true)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    #[test]
    fn first_matching_pattern_wins() {
        let patterns = compile(&[r"Mobile:\s*(\d+)", r"Phone:\s*(\d+)"]);
        let text = "Phone: 111\nMobile: 222";
        assert_eq!(extract_field(text, &patterns, &[]).as_deref(), Some("222"));
    }

    #[test]
    fn dash_capture_falls_through_to_next_pattern() {
        let patterns = compile(&[r"Foo:\s*(\S+)", r"Bar:\s*(\S+)"]);
        let text = "Foo: -\nBar: baz";
        assert_eq!(extract_field(text, &patterns, &[]).as_deref(), Some("baz"));
    }

    #[test]
    fn no_match_returns_none() {
        let patterns = compile(&[r"Foo:\s*(\S+)"]);
        assert_eq!(extract_field("nothing here", &patterns, &[]), None);
    }

    #[test]
    fn skips_matches_after_excluded_prefix() {
        let patterns = compile(&[r"Father's Name:\s*([A-Z ]+?)\s*$"]);
        let text = "Grand Father's Name: HARI\nFather's Name: KRISHNA";
        let not_after = vec!["Grand ".to_owned()];
        assert_eq!(
            extract_field(text, &patterns, &not_after).as_deref(),
            Some("KRISHNA")
        );
        assert_eq!(extract_field(text, &patterns, &[]).as_deref(), Some("HARI"));
    }

    #[test]
    fn lazy_capture_stops_at_terminator() {
        let patterns = compile(&[r"Tole[:\s]+([A-Za-z\s]+?)\s*(?:Telephone|Mobile|$)"]);
        let text = "Tole: Jhamsikhel Telephone No: 123";
        assert_eq!(
            extract_field(text, &patterns, &[]).as_deref(),
            Some("Jhamsikhel")
        );
    }
}
