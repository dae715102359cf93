//! Cleaning rules applied to a raw regex capture before it is stored.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

/// Matches captures that are really dates, e.g. `2045-05-12` or `2001/01/30`.
static DATE_LIKE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}[-/]\d{2}[-/]\d{2}$").expect("valid regex"));

/// Named cleaning rule attached to a field in the pattern tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalize {
    /// Trim only.
    #[default]
    Plain,
    /// Trim and upper-case (names are written in block letters).
    Uppercase,
    /// `M`/`MALE` → `Male`, `F`/`FEMALE` → `Female`.
    Gender,
    /// Keep digits, `-` and `/`; reject dates and year-prefixed numbers.
    Citizenship,
    /// Keep digits only.
    Digits,
    /// Permanent account number: alphanumeric, 9+ chars, at least one digit.
    Pan,
    /// Strip stray `:` and whitespace around address parts.
    Address,
    /// Map English or transliterated account types to `Saving`/`Current`.
    AccountType,
}

impl Normalize {
    /// Cleans `raw`, returning `None` if nothing usable remains.
    #[must_use]
    pub fn apply(self, raw: &str) -> Option<String> {
        let value = raw.trim();
        if value.is_empty() || value == "-" {
            return None;
        }

        let cleaned = match self {
            Self::Plain => value.to_owned(),
            Self::Uppercase => value.to_uppercase(),
            Self::Gender => normalize_gender(value),
            Self::Citizenship => normalize_citizenship(value)?,
            Self::Digits => value.chars().filter(char::is_ascii_digit).collect(),
            Self::Pan => normalize_pan(value)?,
            Self::Address => value
                .trim_matches(|c: char| c == ':' || c.is_whitespace())
                .to_owned(),
            Self::AccountType => normalize_account_type(value),
        };

        if cleaned.is_empty() || cleaned == "-" {
            None
        } else {
            Some(cleaned)
        }
    }
}

/// Cuts `value` at the first occurrence of each label in turn.
///
/// Labels are applied in order, so `["Province", "District"]` turns
/// `"Nepal Province 3 District"` into `"Nepal"`.
#[must_use]
pub fn truncate_at_labels(value: &str, labels: &[String]) -> String {
    let mut out = value.trim();
    for label in labels {
        if let Some(idx) = out.find(label.as_str()) {
            out = out[..idx].trim();
        }
    }
    out.to_owned()
}

fn normalize_gender(value: &str) -> String {
    match value.to_uppercase().as_str() {
        "M" | "MALE" => "Male".to_owned(),
        "F" | "FEMALE" => "Female".to_owned(),
        _ => value.to_owned(),
    }
}

fn normalize_citizenship(value: &str) -> Option<String> {
    let cleaned: String = value
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '/')
        .collect();

    if cleaned.len() < 3
        || DATE_LIKE_RE.is_match(&cleaned)
        || cleaned.starts_with("19")
        || cleaned.starts_with("20")
    {
        log::trace!("Rejected citizenship candidate {cleaned:?}");
        return None;
    }

    Some(cleaned)
}

fn normalize_pan(value: &str) -> Option<String> {
    if value.to_lowercase().ends_with("ies") || value.len() < 9 {
        return None;
    }

    let compact = value.replace('-', "");
    if !compact.chars().all(char::is_alphanumeric) || !compact.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }

    Some(value.to_owned())
}

fn normalize_account_type(value: &str) -> String {
    let lower = value.to_lowercase();
    if lower.contains("saving") || lower == "art" {
        "Saving".to_owned()
    } else if lower.contains("current") || lower == "rntl" {
        "Current".to_owned()
    } else {
        value.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_and_dash_are_rejected() {
        assert_eq!(Normalize::Plain.apply("   "), None);
        assert_eq!(Normalize::Plain.apply(" - "), None);
        assert_eq!(Normalize::Uppercase.apply("-"), None);
    }

    #[test]
    fn uppercases_names() {
        assert_eq!(
            Normalize::Uppercase.apply(" ram bahadur ").as_deref(),
            Some("RAM BAHADUR")
        );
    }

    #[test]
    fn normalizes_gender_codes() {
        assert_eq!(Normalize::Gender.apply("m").as_deref(), Some("Male"));
        assert_eq!(Normalize::Gender.apply("FEMALE").as_deref(), Some("Female"));
        assert_eq!(Normalize::Gender.apply("Other").as_deref(), Some("Other"));
    }

    #[test]
    fn citizenship_keeps_separators() {
        assert_eq!(
            Normalize::Citizenship.apply("27-01-12345.").as_deref(),
            Some("27-01-12345")
        );
        assert_eq!(
            Normalize::Citizenship.apply("311/4456").as_deref(),
            Some("311/4456")
        );
    }

    #[test]
    fn citizenship_rejects_dates_and_years() {
        assert_eq!(Normalize::Citizenship.apply("2045-05-12"), None);
        assert_eq!(Normalize::Citizenship.apply("1995/123"), None);
        assert_eq!(Normalize::Citizenship.apply("20-1"), None);
        assert_eq!(Normalize::Citizenship.apply("12"), None);
    }

    #[test]
    fn digits_strips_everything_else() {
        assert_eq!(Normalize::Digits.apply("No. 55-01 234").as_deref(), Some("5501234"));
        assert_eq!(Normalize::Digits.apply("none"), None);
    }

    #[test]
    fn pan_requires_alphanumeric_with_digit() {
        assert_eq!(Normalize::Pan.apply("301234567").as_deref(), Some("301234567"));
        assert_eq!(Normalize::Pan.apply("Companies"), None);
        assert_eq!(Normalize::Pan.apply("NUMBERONE"), None);
        assert_eq!(Normalize::Pan.apply("12345"), None);
    }

    #[test]
    fn address_strips_colons() {
        assert_eq!(Normalize::Address.apply(": Kaski :").as_deref(), Some("Kaski"));
    }

    #[test]
    fn account_type_maps_transliterations() {
        assert_eq!(Normalize::AccountType.apply("saving").as_deref(), Some("Saving"));
        assert_eq!(Normalize::AccountType.apply("art").as_deref(), Some("Saving"));
        assert_eq!(Normalize::AccountType.apply("rNtL").as_deref(), Some("Current"));
    }

    #[test]
    fn truncates_at_labels_in_order() {
        let labels = vec!["Province".to_owned(), "District".to_owned()];
        assert_eq!(truncate_at_labels("Nepal Province 3 District", &labels), "Nepal");
        assert_eq!(truncate_at_labels("Nepal District Kaski", &labels), "Nepal");
        assert_eq!(truncate_at_labels("Nepal", &labels), "Nepal");
    }
}
