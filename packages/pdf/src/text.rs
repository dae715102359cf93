//! Text input: OCR'd PDFs and plain text dumps.

use std::path::Path;

use crate::PdfError;

/// Extracts the text layer of a PDF held in memory.
///
/// Scanned forms must have been run through OCR first; an image-only PDF
/// yields empty text.
///
/// # Errors
///
/// Returns [`PdfError::Extraction`] if the PDF cannot be parsed.
pub fn extract_text_from_pdf(bytes: &[u8]) -> Result<String, PdfError> {
    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| PdfError::Extraction(format!("{e}")))?;

    log::debug!("Extracted {} characters from PDF", text.len());
    if text.trim().is_empty() {
        log::warn!("PDF has no text layer; was it run through OCR?");
    }

    Ok(text)
}

/// Reads the form text of `path`.
///
/// Files with a `.pdf` extension (any case) go through
/// [`extract_text_from_pdf`]; anything else is read as UTF-8 text.
///
/// # Errors
///
/// Returns [`PdfError`] if the file cannot be read or parsed.
pub fn read_input_text(path: &Path) -> Result<String, PdfError> {
    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

    if is_pdf {
        let bytes = std::fs::read(path)?;
        extract_text_from_pdf(&bytes)
    } else {
        Ok(std::fs::read_to_string(path)?)
    }
}
