#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Field extraction from OCR'd identity form text.
//!
//! Bilingual KYC forms come back from OCR as loosely structured text with
//! English labels and, where the Nepali half was typed in the legacy Preeti
//! font, ASCII transliterations of Devanagari labels. This crate pulls a
//! fixed set of fields out of that text using priority-ordered regex tables
//! (see [`table`]) and cleans each capture (see [`normalize`]).
//!
//! The primary entry point is [`DataParser`].

pub mod extract;
pub mod normalize;
pub mod table;

use formfill_record_models::{ExtractionSummary, FieldCategory, FieldKey, ParsedRecord};

pub use table::PatternTable;

/// Errors raised while loading pattern tables.
#[derive(Debug, thiserror::Error)]
pub enum ParserError {
    /// A pattern table is not valid TOML or does not match the schema.
    #[error("Invalid pattern table '{name}': {source}")]
    Table {
        name: String,
        source: toml::de::Error,
    },

    /// A pattern failed to compile.
    #[error("Invalid regex for {key}: {source}")]
    Regex { key: FieldKey, source: regex::Error },

    /// A pattern has no capture group to take the value from.
    #[error("Pattern for {key} has no capture group: {pattern}")]
    MissingCaptureGroup { key: FieldKey, pattern: String },

    /// A field was listed under a category it does not belong to.
    #[error("Field {key} does not belong to category {category}")]
    CategoryMismatch {
        key: FieldKey,
        category: FieldCategory,
    },

    /// The same field appears twice across the loaded tables.
    #[error("Field {0} is defined more than once")]
    DuplicateField(FieldKey),

    /// A pattern table file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts a [`ParsedRecord`] from form text using a [`PatternTable`].
#[derive(Debug, Clone)]
pub struct DataParser {
    table: PatternTable,
}

impl DataParser {
    /// Creates a parser backed by the embedded pattern tables.
    ///
    /// # Errors
    ///
    /// Returns a [`ParserError`] if an embedded table is malformed.
    pub fn new() -> Result<Self, ParserError> {
        Ok(Self {
            table: PatternTable::embedded()?,
        })
    }

    /// Creates a parser backed by a custom table.
    #[must_use]
    pub const fn with_table(table: PatternTable) -> Self {
        Self { table }
    }

    /// Overlays additional or replacement patterns onto this parser's table.
    pub fn extend(&mut self, overlay: PatternTable) {
        self.table.merge(overlay);
    }

    /// Extracts every known field from `text`.
    ///
    /// Categories are processed in form order; a field is stored only if
    /// one of its patterns matched and the cleaned value is not blank.
    #[must_use]
    pub fn parse(&self, text: &str) -> ParsedRecord {
        let mut record = ParsedRecord::new();
        if text.trim().is_empty() {
            return record;
        }

        let text = text.replace("\r\n", "\n");

        for category in self.table.categories() {
            let before = record.len();
            for field in &category.fields {
                if let Some(value) = extract::extract_clean(&text, field) {
                    record.insert(field.key, value);
                }
            }
            log::debug!(
                "{}: extracted {} of {} fields",
                category.category.label(),
                record.len() - before,
                category.fields.len()
            );
        }

        log::info!(
            "Extracted {} fields from {} characters of text",
            record.len(),
            text.len()
        );

        record
    }

    /// Extracts a single field from `text`.
    #[must_use]
    pub fn extract(&self, text: &str, key: FieldKey) -> Option<String> {
        let field = self.table.field(key)?;
        extract::extract_clean(&text.replace("\r\n", "\n"), field)
    }

    /// Summarizes what [`Self::parse`] recovered.
    #[must_use]
    pub fn summary(&self, record: &ParsedRecord) -> ExtractionSummary {
        ExtractionSummary::of(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Name (In Block Letter): RAM BAHADUR THAPA
Date of Birth AD: 1990-05-15
Gender: M
Citizenship No: 27-01-12345
Issue District Kathmandu
Issue Date 2010-02-03
Beneficiary ID No: 5501234
PAN: 301234567
National ID No: 1234567890
Current Address
Country: Nepal
Province: Bagmati
District: Lalitpur
Municipality: Lalitpur Metropolitan
Ward No: 4
Tole: Jhamsikhel
Telephone No: 015551234
Mobile No: 9841234567
Email ID: ram.thapa@example.com
Permanent Address Country: Nepal Province: Gandaki District: Kaski Municipality: Pokhara Ward No: 7 Tole: Lakeside Telephone No: 061456789 Block No: 12
Grand Father's Name: HARI BAHADUR THAPA
Father's Name: KRISHNA BAHADUR THAPA
Mother's Name: SITA THAPA
Spouse's Name: GITA THAPA
Type of Bank Account: Saving
Bank Account Number: 0123456789012
Name & Address of Bank: Nabil Bank, Kathmandu
Occupation: Service
Organization's Name: Nepal Telecom
Designation: Engineer
Income Limit (Annual Details) Up to 5 Lakh";

    fn parser() -> DataParser {
        DataParser::new().unwrap()
    }

    #[test]
    fn empty_text_yields_empty_record() {
        assert!(parser().parse("").is_empty());
        assert!(parser().parse("   \n  ").is_empty());
    }

    #[test]
    fn text_without_labels_yields_empty_record() {
        assert!(parser().parse("lorem ipsum dolor sit amet").is_empty());
    }

    #[test]
    fn extracts_personal_fields() {
        let record = parser().parse(SAMPLE);
        assert_eq!(record.get(FieldKey::Name), Some("RAM BAHADUR THAPA"));
        assert_eq!(record.get(FieldKey::DateOfBirth), Some("1990-05-15"));
        assert_eq!(record.get(FieldKey::Gender), Some("Male"));
        assert_eq!(record.get(FieldKey::CitizenshipNo), Some("27-01-12345"));
        assert_eq!(record.get(FieldKey::IssueDistrict), Some("Kathmandu"));
        assert_eq!(record.get(FieldKey::IssueDate), Some("2010-02-03"));
        assert_eq!(record.get(FieldKey::BeneficiaryId), Some("5501234"));
        assert_eq!(record.get(FieldKey::PanNo), Some("301234567"));
        assert_eq!(record.get(FieldKey::NationalId), Some("1234567890"));
    }

    #[test]
    fn extracts_current_address() {
        let record = parser().parse(SAMPLE);
        assert_eq!(record.get(FieldKey::CurrentCountry), Some("Nepal"));
        assert_eq!(record.get(FieldKey::CurrentProvince), Some("Bagmati"));
        assert_eq!(record.get(FieldKey::CurrentDistrict), Some("Lalitpur"));
        assert_eq!(
            record.get(FieldKey::CurrentMunicipality),
            Some("Lalitpur Metropolitan")
        );
        assert_eq!(record.get(FieldKey::CurrentWardNo), Some("4"));
        assert_eq!(record.get(FieldKey::CurrentTole), Some("Jhamsikhel"));
        assert_eq!(record.get(FieldKey::CurrentTelephone), Some("015551234"));
        assert_eq!(record.get(FieldKey::CurrentMobile), Some("9841234567"));
        assert_eq!(
            record.get(FieldKey::CurrentEmail),
            Some("ram.thapa@example.com")
        );
    }

    #[test]
    fn extracts_permanent_address_from_single_line() {
        let record = parser().parse(SAMPLE);
        assert_eq!(record.get(FieldKey::PermanentCountry), Some("Nepal"));
        assert_eq!(record.get(FieldKey::PermanentProvince), Some("Gandaki"));
        assert_eq!(record.get(FieldKey::PermanentDistrict), Some("Kaski"));
        assert_eq!(record.get(FieldKey::PermanentMunicipality), Some("Pokhara"));
        assert_eq!(record.get(FieldKey::PermanentWardNo), Some("7"));
        assert_eq!(record.get(FieldKey::PermanentTole), Some("Lakeside"));
        assert_eq!(record.get(FieldKey::PermanentTelephone), Some("061456789"));
        assert_eq!(record.get(FieldKey::PermanentBlockNo), Some("12"));
    }

    #[test]
    fn father_is_not_confused_with_grandfather() {
        let record = parser().parse(SAMPLE);
        assert_eq!(
            record.get(FieldKey::GrandfatherName),
            Some("HARI BAHADUR THAPA")
        );
        assert_eq!(
            record.get(FieldKey::FatherName),
            Some("KRISHNA BAHADUR THAPA")
        );
        assert_eq!(record.get(FieldKey::MotherName), Some("SITA THAPA"));
        assert_eq!(record.get(FieldKey::SpouseName), Some("GITA THAPA"));
        assert!(!record.contains(FieldKey::SonName));
        assert!(!record.contains(FieldKey::DaughterName));
    }

    #[test]
    fn extracts_bank_occupation_and_financial() {
        let record = parser().parse(SAMPLE);
        assert_eq!(record.get(FieldKey::BankAccountType), Some("Saving"));
        assert_eq!(
            record.get(FieldKey::BankAccountNumber),
            Some("0123456789012")
        );
        assert_eq!(record.get(FieldKey::BankName), Some("Nabil Bank, Kathmandu"));
        assert_eq!(record.get(FieldKey::Occupation), Some("Service"));
        assert_eq!(record.get(FieldKey::Organization), Some("Nepal Telecom"));
        assert_eq!(record.get(FieldKey::Designation), Some("Engineer"));
        assert_eq!(record.get(FieldKey::IncomeLimit), Some("Up to 5 Lakh"));
        assert!(!record.contains(FieldKey::AnnualIncome));
    }

    #[test]
    fn absent_sections_are_left_out() {
        let record = parser().parse(SAMPLE);
        for key in FieldKey::for_category(FieldCategory::TemporaryAddress) {
            assert!(!record.contains(key), "{key} should not be extracted");
        }
    }

    #[test]
    fn summary_reflects_extraction() {
        let parser = parser();
        let record = parser.parse(SAMPLE);
        let summary = parser.summary(&record);
        assert_eq!(summary.total_fields, 37);
        assert_eq!(summary.filled_fields, 37);
        assert_eq!(summary.categories[&FieldCategory::Personal], 9);
        assert_eq!(summary.categories[&FieldCategory::PermanentAddress], 8);
        assert_eq!(summary.categories[&FieldCategory::Family], 4);
        assert_eq!(summary.categories[&FieldCategory::TemporaryAddress], 0);
    }

    #[test]
    fn reads_transliterated_labels() {
        let text = "gful/stf g+= 12-34-567\nln· F";
        let parser = parser();
        assert_eq!(
            parser.extract(text, FieldKey::CitizenshipNo).as_deref(),
            Some("12-34-567")
        );
        assert_eq!(
            parser.extract(text, FieldKey::Gender).as_deref(),
            Some("Female")
        );
    }

    #[test]
    fn temporary_address_is_cut_at_province() {
        let text = "Temporary Address Country: India Province Delhi";
        assert_eq!(
            parser()
                .extract(text, FieldKey::TemporaryCountry)
                .as_deref(),
            Some("India")
        );
    }

    #[test]
    fn custom_table_limits_extraction_to_its_fields() {
        let table = PatternTable::from_toml_str(
            "bank_only",
            r#"
category = "bank"

[[fields]]
key = "bank_name"
patterns = ['Bank:\s*(\w+)']
"#,
        )
        .unwrap();
        let parser = DataParser::with_table(table);

        let record = parser.parse("Bank: Nabil\nGender: M\nMobile No: 9800000000\n");
        assert_eq!(record.len(), 1);
        assert_eq!(record.get(FieldKey::BankName), Some("Nabil"));
        assert_eq!(parser.extract("Gender: M", FieldKey::Gender), None);
    }

    #[test]
    fn handles_crlf_line_endings() {
        let record = parser().parse("Gender: F\r\nMobile No: 9800000000\r\n");
        assert_eq!(record.get(FieldKey::Gender), Some("Female"));
        assert_eq!(record.get(FieldKey::CurrentMobile), Some("9800000000"));
    }
}
