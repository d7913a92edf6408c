//! Outcome and error types for the question-answering service.

use crate::{extraction::ExtractionError, generation::GenerationClientError};
use axum::http::StatusCode;
use thiserror::Error;

/// Broad failure classes used to pick the HTTP status for a [`QaError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is malformed or disallowed.
    InvalidInput,
    /// The request is valid but the service has nothing to answer from yet.
    PreconditionFailure,
    /// The PDF parsed but yielded no usable text.
    ExtractionFailure,
    /// The model returned an unusable answer.
    GenerationFailure,
    /// I/O, parsing, or collaborator failure.
    InternalFailure,
}

impl ErrorKind {
    /// HTTP status reported for this kind of failure.
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput | Self::PreconditionFailure | Self::ExtractionFailure => {
                StatusCode::BAD_REQUEST
            }
            Self::GenerationFailure | Self::InternalFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Errors emitted by uploads and questions.
#[derive(Debug, Error)]
pub enum QaError {
    /// Uploaded file name lacks the `.pdf` suffix.
    #[error("File must be a PDF")]
    InvalidFileType,
    /// Multipart request carried no file part.
    #[error("No file uploaded")]
    MissingFile,
    /// Multipart body could not be read.
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),
    /// Question was empty after trimming.
    #[error("Question cannot be empty")]
    EmptyQuestion,
    /// No document has been uploaded yet.
    #[error("No PDF content available")]
    NoDocument,
    /// The PDF contained no extractable text.
    #[error("Could not extract text from PDF")]
    EmptyExtraction,
    /// The model answered with nothing but whitespace.
    #[error("Failed to generate an answer")]
    EmptyAnswer,
    /// Reading or parsing the PDF failed.
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    /// The generation provider failed.
    #[error(transparent)]
    Generation(#[from] GenerationClientError),
    /// The blocking extraction task did not complete.
    #[error("Extraction task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl QaError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidFileType
            | Self::MissingFile
            | Self::InvalidUpload(_)
            | Self::EmptyQuestion => ErrorKind::InvalidInput,
            Self::NoDocument => ErrorKind::PreconditionFailure,
            Self::EmptyExtraction => ErrorKind::ExtractionFailure,
            Self::EmptyAnswer => ErrorKind::GenerationFailure,
            Self::Extraction(_) | Self::Generation(_) | Self::Task(_) => {
                ErrorKind::InternalFailure
            }
        }
    }
}

/// Summary of a successful upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    /// Pages read from the document.
    pub pages: usize,
    /// Characters stored as the new document text.
    pub characters: usize,
}
