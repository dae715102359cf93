//! Pattern tables: loads per-category field patterns from embedded TOML.
//!
//! Each `.toml` file in `packages/parser/patterns/` is baked into the binary
//! at compile time via [`include_str!`]. A table lists, for every field of
//! one [`FieldCategory`], the regexes to try in priority order plus the
//! cleaning rules applied to the winning capture.

use std::path::Path;

use formfill_record_models::{FieldCategory, FieldKey};
use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::ParserError;
use crate::normalize::Normalize;

/// TOML tables embedded at compile time, in form order.
const PATTERN_TOMLS: &[(&str, &str)] = &[
    ("personal", include_str!("../patterns/personal.toml")),
    (
        "current_address",
        include_str!("../patterns/current_address.toml"),
    ),
    (
        "permanent_address",
        include_str!("../patterns/permanent_address.toml"),
    ),
    ("family", include_str!("../patterns/family.toml")),
    ("bank", include_str!("../patterns/bank.toml")),
    ("occupation", include_str!("../patterns/occupation.toml")),
    (
        "temporary_address",
        include_str!("../patterns/temporary_address.toml"),
    ),
    ("financial", include_str!("../patterns/financial.toml")),
];

// ── Serialized form ──────────────────────────────────────────────────────

/// One category's pattern file, as written in TOML.
#[derive(Debug, Deserialize)]
struct CategoryDefinition {
    category: FieldCategory,
    fields: Vec<FieldDefinition>,
}

/// A single field entry, as written in TOML.
#[derive(Debug, Deserialize)]
struct FieldDefinition {
    key: FieldKey,
    patterns: Vec<String>,
    #[serde(default)]
    normalize: Normalize,
    /// Labels that mark where an over-long capture should be cut.
    #[serde(default)]
    truncate_at: Vec<String>,
    /// Matches immediately preceded by any of these strings are skipped.
    #[serde(default)]
    not_after: Vec<String>,
}

// ── Compiled form ────────────────────────────────────────────────────────

/// Compiled patterns and cleaning rules for one [`FieldKey`].
#[derive(Debug, Clone)]
pub struct FieldPatterns {
    pub key: FieldKey,
    pub patterns: Vec<Regex>,
    pub normalize: Normalize,
    pub truncate_at: Vec<String>,
    pub not_after: Vec<String>,
}

impl FieldPatterns {
    fn compile(def: FieldDefinition) -> Result<Self, ParserError> {
        let patterns = def
            .patterns
            .iter()
            .map(|pattern| compile_pattern(def.key, pattern))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            key: def.key,
            patterns,
            normalize: def.normalize,
            truncate_at: def.truncate_at,
            not_after: def.not_after,
        })
    }
}

/// Compiles `pattern` case-insensitive and multi-line, requiring at least
/// one capture group.
fn compile_pattern(key: FieldKey, pattern: &str) -> Result<Regex, ParserError> {
    let re = RegexBuilder::new(pattern)
        .case_insensitive(true)
        .multi_line(true)
        .build()
        .map_err(|source| ParserError::Regex { key, source })?;

    if re.captures_len() < 2 {
        return Err(ParserError::MissingCaptureGroup {
            key,
            pattern: pattern.to_owned(),
        });
    }

    Ok(re)
}

/// All fields of one category, in extraction order.
#[derive(Debug, Clone)]
pub struct CategoryPatterns {
    pub category: FieldCategory,
    pub fields: Vec<FieldPatterns>,
}

/// The full set of compiled pattern tables.
#[derive(Debug, Clone, Default)]
pub struct PatternTable {
    categories: Vec<CategoryPatterns>,
}

impl PatternTable {
    /// Loads and compiles every embedded pattern table.
    ///
    /// # Errors
    ///
    /// Returns a [`ParserError`] if an embedded table is malformed.
    pub fn embedded() -> Result<Self, ParserError> {
        let mut table = Self::default();
        for (name, toml) in PATTERN_TOMLS {
            table.add(parse_category(name, toml)?)?;
        }

        log::debug!(
            "Loaded {} pattern tables covering {} fields",
            table.categories.len(),
            table.field_count()
        );

        Ok(table)
    }

    /// Parses a single category table from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a [`ParserError`] if the TOML is malformed, a key does not
    /// belong to the declared category, or a pattern fails to compile.
    pub fn from_toml_str(name: &str, toml: &str) -> Result<Self, ParserError> {
        let mut table = Self::default();
        table.add(parse_category(name, toml)?)?;
        Ok(table)
    }

    /// Parses a single category table from a TOML file on disk.
    ///
    /// # Errors
    ///
    /// Returns a [`ParserError`] if the file cannot be read or is invalid.
    pub fn from_path(path: &Path) -> Result<Self, ParserError> {
        let toml = std::fs::read_to_string(path)?;
        Self::from_toml_str(&path.display().to_string(), &toml)
    }

    /// Overlays `other` onto this table.
    ///
    /// Fields already present are replaced in place (keeping their position
    /// in the extraction order); new fields are appended to their category.
    pub fn merge(&mut self, other: Self) {
        for overlay in other.categories {
            let Some(existing) = self
                .categories
                .iter_mut()
                .find(|c| c.category == overlay.category)
            else {
                self.categories.push(overlay);
                continue;
            };

            for field in overlay.fields {
                if let Some(slot) = existing.fields.iter_mut().find(|f| f.key == field.key) {
                    log::debug!("Overriding patterns for {}", field.key);
                    *slot = field;
                } else {
                    existing.fields.push(field);
                }
            }
        }
    }

    /// Categories in extraction order.
    #[must_use]
    pub fn categories(&self) -> &[CategoryPatterns] {
        &self.categories
    }

    /// Looks up the compiled patterns for `key`.
    #[must_use]
    pub fn field(&self, key: FieldKey) -> Option<&FieldPatterns> {
        self.categories
            .iter()
            .flat_map(|c| c.fields.iter())
            .find(|f| f.key == key)
    }

    /// Total number of fields across all categories.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.categories.iter().map(|c| c.fields.len()).sum()
    }

    fn add(&mut self, category: CategoryPatterns) -> Result<(), ParserError> {
        for field in &category.fields {
            if self.field(field.key).is_some() {
                return Err(ParserError::DuplicateField(field.key));
            }
        }
        self.categories.push(category);
        Ok(())
    }
}

fn parse_category(name: &str, toml: &str) -> Result<CategoryPatterns, ParserError> {
    let def: CategoryDefinition =
        toml::de::from_str(toml).map_err(|source| ParserError::Table {
            name: name.to_owned(),
            source,
        })?;

    let mut fields = Vec::with_capacity(def.fields.len());
    for field in def.fields {
        if field.key.category() != def.category {
            return Err(ParserError::CategoryMismatch {
                key: field.key,
                category: def.category,
            });
        }
        if fields.iter().any(|f: &FieldPatterns| f.key == field.key) {
            return Err(ParserError::DuplicateField(field.key));
        }
        fields.push(FieldPatterns::compile(field)?);
    }

    Ok(CategoryPatterns {
        category: def.category,
        fields,
    })
}
