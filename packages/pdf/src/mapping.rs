//! Record-to-template field mapping.
//!
//! A [`FieldMapping`] says which PDF widget receives each extracted value.
//! Plain values go to text fields; gender, account type and occupation are
//! rendered as checkbox ticks.

use std::collections::BTreeMap;
use std::path::Path;

use formfill_record_models::{FieldCategory, FieldKey, ParsedRecord};
use serde::{Deserialize, Serialize};

use crate::PdfError;

/// Mapping for the bundled bilingual KYC template.
const DEFAULT_MAPPING: &str = include_str!("../mappings/default.toml");

/// A value to write into one PDF field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldUpdate {
    Text(String),
    /// Tick (`true`) or clear (`false`) a checkbox or radio widget.
    Check(bool),
}

/// Checkbox pair selected by the extracted gender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderBoxes {
    pub male: String,
    pub female: String,
}

/// Checkbox pair selected by the extracted bank account type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTypeBoxes {
    pub saving: String,
    pub current: String,
}

/// Ticks `field` when the occupation contains any of `keywords`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupationRule {
    pub keywords: Vec<String>,
    pub field: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Record field → PDF text field name.
    pub text: BTreeMap<FieldKey, String>,
    pub gender: Option<GenderBoxes>,
    pub account_type: Option<AccountTypeBoxes>,
    #[serde(default)]
    pub occupation: Vec<OccupationRule>,
}

/// Counts reported by `formfill mapping`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingInfo {
    pub text_fields: usize,
    pub checkbox_fields: usize,
    pub categories: BTreeMap<FieldCategory, usize>,
}

impl FieldMapping {
    /// Loads the mapping for the bundled template.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Mapping`] if the embedded mapping is malformed.
    pub fn embedded() -> Result<Self, PdfError> {
        Self::from_toml_str(DEFAULT_MAPPING)
    }

    /// Parses a mapping from TOML.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::Mapping`] if the TOML does not describe a mapping.
    pub fn from_toml_str(toml: &str) -> Result<Self, PdfError> {
        toml::de::from_str(toml).map_err(|e| PdfError::Mapping(e.to_string()))
    }

    /// Reads a mapping file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError`] if the file cannot be read or parsed.
    pub fn from_path(path: &Path) -> Result<Self, PdfError> {
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }

    fn checkbox_fields(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(gender) = &self.gender {
            names.extend([gender.male.as_str(), gender.female.as_str()]);
        }
        if let Some(account) = &self.account_type {
            names.extend([account.saving.as_str(), account.current.as_str()]);
        }
        names.extend(self.occupation.iter().map(|rule| rule.field.as_str()));
        names
    }

    #[must_use]
    pub fn info(&self) -> MappingInfo {
        let mut categories: BTreeMap<FieldCategory, usize> =
            FieldCategory::all().iter().map(|c| (*c, 0)).collect();
        for key in self.text.keys() {
            *categories.entry(key.category()).or_default() += 1;
        }

        MappingInfo {
            text_fields: self.text.len(),
            checkbox_fields: self.checkbox_fields().len(),
            categories,
        }
    }

    /// Translates a record into per-field updates for [`crate::fill`].
    ///
    /// Text values are copied as-is. A recognised gender or account type
    /// ticks one box of its pair and clears the other; an unrecognised one
    /// leaves both untouched. An occupation ticks the box of the first rule
    /// whose keyword it contains and clears the rest.
    #[must_use]
    pub fn prepare_updates(&self, record: &ParsedRecord) -> BTreeMap<String, FieldUpdate> {
        let mut updates = BTreeMap::new();

        for (key, pdf_field) in &self.text {
            if let Some(value) = record.get(*key) {
                updates.insert(pdf_field.clone(), FieldUpdate::Text(value.to_owned()));
            }
        }

        if let (Some(boxes), Some(gender)) = (&self.gender, record.get(FieldKey::Gender)) {
            let lower = gender.to_lowercase();
            let choice = match lower.as_str() {
                "male" | "m" => Some(true),
                "female" | "f" => Some(false),
                _ => None,
            };
            if let Some(is_male) = choice {
                updates.insert(boxes.male.clone(), FieldUpdate::Check(is_male));
                updates.insert(boxes.female.clone(), FieldUpdate::Check(!is_male));
            } else {
                log::warn!("Unrecognised gender {gender:?}; leaving checkboxes unset");
            }
        }

        if let (Some(boxes), Some(kind)) =
            (&self.account_type, record.get(FieldKey::BankAccountType))
        {
            let lower = kind.to_lowercase();
            if lower.contains("saving") {
                updates.insert(boxes.saving.clone(), FieldUpdate::Check(true));
                updates.insert(boxes.current.clone(), FieldUpdate::Check(false));
            } else if lower.contains("current") {
                updates.insert(boxes.saving.clone(), FieldUpdate::Check(false));
                updates.insert(boxes.current.clone(), FieldUpdate::Check(true));
            } else {
                log::warn!("Unrecognised account type {kind:?}; leaving checkboxes unset");
            }
        }

        if let Some(occupation) = record.get(FieldKey::Occupation) {
            let lower = occupation.to_lowercase();
            let matched = self
                .occupation
                .iter()
                .position(|rule| rule.keywords.iter().any(|k| lower.contains(k.as_str())));

            match matched {
                Some(idx) => {
                    for (i, rule) in self.occupation.iter().enumerate() {
                        updates.insert(rule.field.clone(), FieldUpdate::Check(i == idx));
                    }
                }
                None => log::debug!("No occupation checkbox for {occupation:?}"),
            }
        }

        updates
    }
}
