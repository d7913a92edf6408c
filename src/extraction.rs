//! PDF text extraction.
//!
//! Uploads are copied into a scoped temporary file, read back as a paged document, and flattened
//! into one string in page order. The temporary file is removed when the guard drops, so every
//! exit path (including a panic inside the PDF library) cleans up after itself.

use std::io::Write;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;

/// Required suffix for uploaded file names. Matched case-sensitively.
pub const PDF_SUFFIX: &str = ".pdf";

/// Errors produced while turning an uploaded PDF into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Temporary file could not be created, written, or read back.
    #[error("Temporary file error: {0}")]
    TempFile(#[from] std::io::Error),
    /// The PDF library rejected the document.
    #[error("Failed to read PDF: {0}")]
    Pdf(String),
    /// The PDF library panicked on malformed input.
    #[error("PDF extraction panicked (malformed document)")]
    Panicked,
}

/// Text extracted from a single upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    /// Page texts concatenated in page order without separators.
    pub text: String,
    /// Number of pages read from the document.
    pub pages: usize,
}

/// Whether an upload's file name carries the PDF suffix.
pub fn is_pdf_file_name(file_name: &str) -> bool {
    file_name.ends_with(PDF_SUFFIX)
}

/// Persist `bytes` into a temporary file under `tmp_dir` (or the OS temp dir) and extract its text.
///
/// Blocking; run it on a blocking thread from async contexts.
pub fn extract_pdf_text(bytes: &[u8], tmp_dir: Option<&Path>) -> Result<ExtractedText, ExtractionError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("pdfqa-").suffix(PDF_SUFFIX);
    let mut temp: NamedTempFile = match tmp_dir {
        Some(dir) => builder.tempfile_in(dir)?,
        None => builder.tempfile()?,
    };
    temp.write_all(bytes)?;
    temp.flush()?;
    tracing::debug!(path = %temp.path().display(), bytes = bytes.len(), "Persisted upload");

    let persisted = std::fs::read(temp.path())?;
    let pages = extract_pages(&persisted)?;
    let extracted = ExtractedText {
        pages: pages.len(),
        text: join_pages(pages),
    };

    if let Err(err) = temp.close() {
        tracing::warn!(error = %err, "Failed to remove temporary upload");
    }
    Ok(extracted)
}

fn extract_pages(data: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(data)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(err)) => Err(ExtractionError::Pdf(err.to_string())),
        Err(_) => Err(ExtractionError::Panicked),
    }
}

fn join_pages(pages: Vec<String>) -> String {
    pages.concat()
}
