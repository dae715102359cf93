#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Extract-then-fill orchestration.
//!
//! A [`Transcriber`] bundles the three pieces needed to turn an OCR'd form
//! into a filled template: a [`DataParser`], a [`FieldMapping`] and the
//! template bytes. It is built once from a [`TranscribeConfig`] and can then
//! process any number of inputs.

pub mod progress;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use formfill_parser::{DataParser, ParserError, PatternTable};
use formfill_pdf::{FieldMapping, FillReport, PdfError};
use formfill_record_models::{ExtractionSummary, ParsedRecord};
use serde::Serialize;

use crate::progress::ProgressCallback;

/// Environment variable overriding the template path.
pub const TEMPLATE_ENV: &str = "FORMFILL_TEMPLATE";

/// Template used when neither a path nor [`TEMPLATE_ENV`] is given.
pub const DEFAULT_TEMPLATE: &str = "./EditablePdf.pdf";

/// Directory batch output goes to by default.
pub const DEFAULT_OUTPUT_DIR: &str = "./filled";

#[derive(Debug, thiserror::Error)]
pub enum TranscribeError {
    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    /// The template file could not be read.
    #[error("Cannot read template {path}: {source}")]
    Template {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Where a [`Transcriber`] gets its template, patterns and mapping from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscribeConfig {
    pub template: PathBuf,
    /// Extra pattern table overlaid on the embedded ones.
    pub patterns: Option<PathBuf>,
    /// Mapping file replacing the embedded one.
    pub mapping: Option<PathBuf>,
    pub output_dir: PathBuf,
}

impl Default for TranscribeConfig {
    fn default() -> Self {
        Self {
            template: PathBuf::from(DEFAULT_TEMPLATE),
            patterns: None,
            mapping: None,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
        }
    }
}

impl TranscribeConfig {
    /// Defaults, with the template taken from [`TEMPLATE_ENV`] if set.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_template_override(std::env::var(TEMPLATE_ENV).ok())
    }

    /// Replaces the template with `value` unless it is missing or blank.
    #[must_use]
    pub fn with_template_override(mut self, value: Option<String>) -> Self {
        match value {
            Some(template) if !template.trim().is_empty() => {
                self.template = PathBuf::from(template.trim());
            }
            Some(_) => log::debug!("Ignoring blank {TEMPLATE_ENV}"),
            None => {}
        }
        self
    }

    #[must_use]
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = template.into();
        self
    }

    #[must_use]
    pub fn with_patterns(mut self, patterns: Option<PathBuf>) -> Self {
        self.patterns = patterns;
        self
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: Option<PathBuf>) -> Self {
        self.mapping = mapping;
        self
    }

    #[must_use]
    pub fn with_output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }
}

/// A filled template ready to be written out.
#[derive(Debug, Clone)]
pub struct FilledForm {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// Result of transcribing one input.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub input: PathBuf,
    pub output: PathBuf,
    pub summary: ExtractionSummary,
    pub report: FillReport,
}

/// One input that could not be transcribed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub input: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub succeeded: Vec<Outcome>,
    pub failed: Vec<BatchFailure>,
}

/// Extracts records from form text and fills them into a template.
#[derive(Debug, Clone)]
pub struct Transcriber {
    parser: DataParser,
    mapping: FieldMapping,
    template: Vec<u8>,
}

impl Transcriber {
    /// Loads the template, patterns and mapping named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TranscribeError`] if the template cannot be read or a
    /// pattern or mapping file is invalid.
    pub fn new(config: &TranscribeConfig) -> Result<Self, TranscribeError> {
        let template =
            std::fs::read(&config.template).map_err(|source| TranscribeError::Template {
                path: config.template.clone(),
                source,
            })?;
        log::debug!(
            "Loaded template {} ({} bytes)",
            config.template.display(),
            template.len()
        );

        let mut parser = DataParser::new()?;
        if let Some(path) = &config.patterns {
            log::info!("Overlaying patterns from {}", path.display());
            parser.extend(PatternTable::from_path(path)?);
        }

        let mapping = match &config.mapping {
            Some(path) => FieldMapping::from_path(path)?,
            None => FieldMapping::embedded()?,
        };

        Ok(Self::from_parts(parser, mapping, template))
    }

    #[must_use]
    pub const fn from_parts(parser: DataParser, mapping: FieldMapping, template: Vec<u8>) -> Self {
        Self {
            parser,
            mapping,
            template,
        }
    }

    /// Reads `input` (PDF or text) and extracts its fields.
    ///
    /// # Errors
    ///
    /// Returns [`TranscribeError`] if the input cannot be read.
    pub fn extract(&self, input: &Path) -> Result<ParsedRecord, TranscribeError> {
        let text = formfill_pdf::read_input_text(input)?;
        Ok(self.parser.parse(&text))
    }

    /// Fills the template with `record`.
    ///
    /// # Errors
    ///
    /// Returns [`TranscribeError::Pdf`] if the template cannot be filled.
    pub fn fill(&self, record: &ParsedRecord) -> Result<FilledForm, TranscribeError> {
        let updates = self.mapping.prepare_updates(record);
        let filled = formfill_pdf::fill_template(&self.template, &updates)?;
        Ok(FilledForm {
            bytes: filled.bytes,
            report: filled.report,
        })
    }

    /// Fills the template with `record` and writes it to `output`, creating
    /// parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns [`TranscribeError`] if filling or writing fails.
    pub fn write_filled(
        &self,
        record: &ParsedRecord,
        output: &Path,
    ) -> Result<FillReport, TranscribeError> {
        let filled = self.fill(record)?;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(output, &filled.bytes)?;
        log::info!("Wrote {}", output.display());
        Ok(filled.report)
    }

    /// Extracts `input` and writes the filled template to `output`.
    ///
    /// # Errors
    ///
    /// Returns [`TranscribeError`] if any step fails.
    pub fn transcribe(&self, input: &Path, output: &Path) -> Result<Outcome, TranscribeError> {
        let record = self.extract(input)?;
        if record.is_empty() {
            log::warn!("No fields extracted from {}", input.display());
        }
        let summary = self.parser.summary(&record);
        let report = self.write_filled(&record, output)?;

        Ok(Outcome {
            input: input.to_path_buf(),
            output: output.to_path_buf(),
            summary,
            report,
        })
    }

    /// Transcribes every input into `output_dir`.
    ///
    /// A failing input is logged and recorded in the report; the remaining
    /// inputs are still processed. Inputs sharing a file stem get numbered
    /// outputs (`form_filled.pdf`, `form_2_filled.pdf`) so none is
    /// overwritten.
    pub fn transcribe_batch(
        &self,
        inputs: &[PathBuf],
        output_dir: &Path,
        progress: &Arc<dyn ProgressCallback>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut used = BTreeSet::new();
        progress.set_total(inputs.len() as u64);

        for input in inputs {
            progress.set_message(input.display().to_string());
            let output = unique_output_path(input, output_dir, &mut used);

            match self.transcribe(input, &output) {
                Ok(outcome) => report.succeeded.push(outcome),
                Err(e) => {
                    log::error!("Failed to transcribe {}: {e}", input.display());
                    report.failed.push(BatchFailure {
                        input: input.clone(),
                        error: e.to_string(),
                    });
                }
            }

            progress.inc(1);
        }

        progress.finish(format!(
            "{} transcribed, {} failed",
            report.succeeded.len(),
            report.failed.len()
        ));

        report
    }
}

/// `<output_dir>/<input stem>_filled.pdf`
#[must_use]
pub fn output_path_for(input: &Path, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}_filled.pdf", input_stem(input)))
}

fn input_stem(input: &Path) -> String {
    input
        .file_stem()
        .map_or_else(|| "form".to_owned(), |s| s.to_string_lossy().into_owned())
}

/// Like [`output_path_for`], but numbers the name (`<stem>_<n>_filled.pdf`)
/// until it is not in `used`, then records it.
fn unique_output_path(input: &Path, output_dir: &Path, used: &mut BTreeSet<PathBuf>) -> PathBuf {
    let mut output = output_path_for(input, output_dir);
    let mut n = 2;
    while used.contains(&output) {
        output = output_dir.join(format!("{}_{n}_filled.pdf", input_stem(input)));
        n += 1;
    }
    if n > 2 {
        log::warn!(
            "{} shares its name with an earlier input; writing {}",
            input.display(),
            output.display()
        );
    }
    used.insert(output.clone());
    output
}
