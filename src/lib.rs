#![deny(missing_docs)]

//! Core library for the PDF question-answering server.

/// HTTP routing and handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Single-slot document storage.
pub mod document;
/// PDF text extraction.
pub mod extraction;
/// Text-generation client abstraction and the Cohere adapter.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Upload and question orchestration.
pub mod qa;
