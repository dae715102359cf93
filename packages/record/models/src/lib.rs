#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field keys and record types for identity form transcription.
//!
//! Every value pulled out of an OCR'd KYC form is stored under a
//! [`FieldKey`], and every key belongs to exactly one [`FieldCategory`].
//! A [`ParsedRecord`] is the unit handed from the parser to the PDF filler.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Top-level grouping of form fields, in the order sections appear on the
/// form.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldCategory {
    /// Name, birth date, identity document numbers
    Personal,
    /// Where the applicant currently lives
    CurrentAddress,
    /// Address of record on the citizenship certificate
    PermanentAddress,
    /// Parents, grandparent, spouse and children
    Family,
    /// Bank account details
    Bank,
    /// Employment details
    Occupation,
    /// Temporary residence, if any
    TemporaryAddress,
    /// Income bracket and annual income
    Financial,
}

impl FieldCategory {
    /// Human-readable section heading.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "Personal information",
            Self::CurrentAddress => "Current address",
            Self::PermanentAddress => "Permanent address",
            Self::Family => "Family members",
            Self::Bank => "Bank details",
            Self::Occupation => "Occupation",
            Self::TemporaryAddress => "Temporary address",
            Self::Financial => "Financial details",
        }
    }

    /// Returns all variants of this enum, in form order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Personal,
            Self::CurrentAddress,
            Self::PermanentAddress,
            Self::Family,
            Self::Bank,
            Self::Occupation,
            Self::TemporaryAddress,
            Self::Financial,
        ]
    }
}

/// Every field the parser knows how to extract.
///
/// Serialized as its `snake_case` name, which is also the key used in JSON
/// records and in the pattern/mapping TOML tables.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FieldKey {
    Name,
    DateOfBirth,
    Gender,
    CitizenshipNo,
    BeneficiaryId,
    PanNo,
    NationalId,
    IssueDistrict,
    IssueDate,

    CurrentCountry,
    CurrentProvince,
    CurrentDistrict,
    CurrentMunicipality,
    CurrentWardNo,
    CurrentTole,
    CurrentTelephone,
    CurrentMobile,
    CurrentEmail,

    PermanentCountry,
    PermanentProvince,
    PermanentDistrict,
    PermanentMunicipality,
    PermanentWardNo,
    PermanentTole,
    PermanentTelephone,
    PermanentBlockNo,

    FatherName,
    MotherName,
    GrandfatherName,
    SpouseName,
    SonName,
    DaughterName,

    BankAccountType,
    BankAccountNumber,
    BankName,

    Occupation,
    Organization,
    Designation,

    TemporaryCountry,
    TemporaryProvince,
    TemporaryDistrict,
    TemporaryMunicipality,
    TemporaryWardNo,
    TemporaryTole,
    TemporaryTelephone,
    TemporaryMobile,
    TemporaryEmail,

    IncomeLimit,
    AnnualIncome,
}

impl FieldKey {
    /// Returns the [`FieldCategory`] this key belongs to.
    #[must_use]
    pub const fn category(self) -> FieldCategory {
        match self {
            Self::Name
            | Self::DateOfBirth
            | Self::Gender
            | Self::CitizenshipNo
            | Self::BeneficiaryId
            | Self::PanNo
            | Self::NationalId
            | Self::IssueDistrict
            | Self::IssueDate => FieldCategory::Personal,

            Self::CurrentCountry
            | Self::CurrentProvince
            | Self::CurrentDistrict
            | Self::CurrentMunicipality
            | Self::CurrentWardNo
            | Self::CurrentTole
            | Self::CurrentTelephone
            | Self::CurrentMobile
            | Self::CurrentEmail => FieldCategory::CurrentAddress,

            Self::PermanentCountry
            | Self::PermanentProvince
            | Self::PermanentDistrict
            | Self::PermanentMunicipality
            | Self::PermanentWardNo
            | Self::PermanentTole
            | Self::PermanentTelephone
            | Self::PermanentBlockNo => FieldCategory::PermanentAddress,

            Self::FatherName
            | Self::MotherName
            | Self::GrandfatherName
            | Self::SpouseName
            | Self::SonName
            | Self::DaughterName => FieldCategory::Family,

            Self::BankAccountType | Self::BankAccountNumber | Self::BankName => {
                FieldCategory::Bank
            }

            Self::Occupation | Self::Organization | Self::Designation => {
                FieldCategory::Occupation
            }

            Self::TemporaryCountry
            | Self::TemporaryProvince
            | Self::TemporaryDistrict
            | Self::TemporaryMunicipality
            | Self::TemporaryWardNo
            | Self::TemporaryTole
            | Self::TemporaryTelephone
            | Self::TemporaryMobile
            | Self::TemporaryEmail => FieldCategory::TemporaryAddress,

            Self::IncomeLimit | Self::AnnualIncome => FieldCategory::Financial,
        }
    }

    /// Display label, e.g. `"Date Of Birth"` for [`Self::DateOfBirth`].
    #[must_use]
    pub fn label(self) -> String {
        self.as_ref()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                chars.next().map_or_else(String::new, |first| {
                    first.to_uppercase().chain(chars).collect::<String>()
                })
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns all keys belonging to the given category.
    #[must_use]
    pub fn for_category(category: FieldCategory) -> Vec<Self> {
        Self::all()
            .iter()
            .copied()
            .filter(|key| key.category() == category)
            .collect()
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Name,
            Self::DateOfBirth,
            Self::Gender,
            Self::CitizenshipNo,
            Self::BeneficiaryId,
            Self::PanNo,
            Self::NationalId,
            Self::IssueDistrict,
            Self::IssueDate,
            Self::CurrentCountry,
            Self::CurrentProvince,
            Self::CurrentDistrict,
            Self::CurrentMunicipality,
            Self::CurrentWardNo,
            Self::CurrentTole,
            Self::CurrentTelephone,
            Self::CurrentMobile,
            Self::CurrentEmail,
            Self::PermanentCountry,
            Self::PermanentProvince,
            Self::PermanentDistrict,
            Self::PermanentMunicipality,
            Self::PermanentWardNo,
            Self::PermanentTole,
            Self::PermanentTelephone,
            Self::PermanentBlockNo,
            Self::FatherName,
            Self::MotherName,
            Self::GrandfatherName,
            Self::SpouseName,
            Self::SonName,
            Self::DaughterName,
            Self::BankAccountType,
            Self::BankAccountNumber,
            Self::BankName,
            Self::Occupation,
            Self::Organization,
            Self::Designation,
            Self::TemporaryCountry,
            Self::TemporaryProvince,
            Self::TemporaryDistrict,
            Self::TemporaryMunicipality,
            Self::TemporaryWardNo,
            Self::TemporaryTole,
            Self::TemporaryTelephone,
            Self::TemporaryMobile,
            Self::TemporaryEmail,
            Self::IncomeLimit,
            Self::AnnualIncome,
        ]
    }
}

/// Returns `true` if `value` carries no information: empty after trimming,
/// or the lone `-` placeholder printed on blank form lines.
#[must_use]
pub fn is_blank(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed == "-"
}

/// Values extracted from a single form, keyed by [`FieldKey`].
///
/// Serializes as a flat JSON object (`{"name": "RAM BAHADUR", ...}`).
/// Blank values are never stored, including when deserializing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<FieldKey, String>",
    into = "BTreeMap<FieldKey, String>"
)]
pub struct ParsedRecord {
    fields: BTreeMap<FieldKey, String>,
}

impl ParsedRecord {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Stores `value` (trimmed) under `key`, replacing any previous value.
    ///
    /// Returns `false` and leaves the record untouched if the value is blank.
    pub fn insert(&mut self, key: FieldKey, value: impl AsRef<str>) -> bool {
        let value = value.as_ref();
        if is_blank(value) {
            return false;
        }
        self.fields.insert(key, value.trim().to_owned());
        true
    }

    #[must_use]
    pub fn get(&self, key: FieldKey) -> Option<&str> {
        self.fields.get(&key).map(String::as_str)
    }

    #[must_use]
    pub fn contains(&self, key: FieldKey) -> bool {
        self.fields.contains_key(&key)
    }

    pub fn remove(&mut self, key: FieldKey) -> Option<String> {
        self.fields.remove(&key)
    }

    /// Iterates fields in [`FieldKey`] order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, &str)> {
        self.fields.iter().map(|(k, v)| (*k, v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromIterator<(FieldKey, String)> for ParsedRecord {
    fn from_iter<T: IntoIterator<Item = (FieldKey, String)>>(iter: T) -> Self {
        let mut record = Self::new();
        for (key, value) in iter {
            record.insert(key, value);
        }
        record
    }
}

impl From<BTreeMap<FieldKey, String>> for ParsedRecord {
    fn from(fields: BTreeMap<FieldKey, String>) -> Self {
        fields.into_iter().collect()
    }
}

impl From<ParsedRecord> for BTreeMap<FieldKey, String> {
    fn from(record: ParsedRecord) -> Self {
        record.fields
    }
}

/// Counts describing how much of a form was recovered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionSummary {
    /// Number of keys present in the record.
    pub total_fields: usize,
    /// Keys with a non-blank value.
    pub filled_fields: usize,
    /// Keys present but blank.
    pub empty_fields: usize,
    /// Number of extracted fields per category.
    pub categories: BTreeMap<FieldCategory, usize>,
}

impl ExtractionSummary {
    /// Builds a summary of `record`.
    #[must_use]
    pub fn of(record: &ParsedRecord) -> Self {
        let mut categories: BTreeMap<FieldCategory, usize> = FieldCategory::all()
            .iter()
            .map(|category| (*category, 0))
            .collect();

        let mut filled_fields = 0;
        for (key, value) in record.iter() {
            if !value.trim().is_empty() {
                filled_fields += 1;
            }
            *categories.entry(key.category()).or_default() += 1;
        }

        Self {
            total_fields: record.len(),
            filled_fields,
            empty_fields: record.len() - filled_fields,
            categories,
        }
    }

    /// Fraction of all known [`FieldKey`]s that were filled, in `0..=100`.
    #[must_use]
    pub fn coverage_percent(&self) -> usize {
        self.filled_fields * 100 / FieldKey::all().len()
    }
}
