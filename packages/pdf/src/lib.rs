#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! PDF input and output for form transcription.
//!
//! Reads form text out of scanned-and-OCR'd PDFs ([`text`]), inspects the
//! interactive fields of a fillable template ([`form`]), maps extracted
//! records onto those fields ([`mapping`]) and writes the values back
//! ([`fill`]). Text extraction uses [`pdf_extract`]; everything touching
//! the form dictionary goes through [`lopdf`].

pub mod fill;
pub mod form;
pub mod mapping;
pub mod text;

pub use fill::{FillReport, FilledPdf, fill_template};
pub use form::{FieldType, FormField, list_form_fields, read_form_fields};
pub use mapping::{FieldMapping, FieldUpdate};
pub use text::{extract_text_from_pdf, read_input_text};

/// Errors raised while reading or filling PDFs.
#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    /// PDF text extraction failed.
    #[error("PDF extraction error: {0}")]
    Extraction(String),

    /// The PDF object structure could not be read or written.
    #[error("PDF error: {0}")]
    Lopdf(#[from] lopdf::Error),

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The template has no interactive form fields.
    #[error("Template has no fillable form fields")]
    NoForm,

    /// A field mapping file is invalid.
    #[error("Invalid field mapping: {0}")]
    Mapping(String),
}
