//! Question answering over the uploaded document: ingestion, prompt assembly, and generation.

pub mod prompt;
mod service;
pub mod types;

pub use service::{GenerationSettings, QaApi, QaService};
pub use types::{ErrorKind, IngestOutcome, QaError};
