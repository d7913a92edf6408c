//! Service coordinating PDF ingestion, the document slot, and answer generation.

use crate::{
    config::Config,
    document::DocumentStore,
    extraction::{extract_pdf_text, is_pdf_file_name},
    generation::{GenerationClient, GenerationRequest, get_generation_client},
    qa::{
        prompt::{DEFAULT_EXCERPT_CHARS, build_prompt},
        types::{IngestOutcome, QaError},
    },
};
use async_trait::async_trait;
use axum::body::Bytes;
use std::path::PathBuf;

/// Abstraction over the question-answering pipeline used by the HTTP surface.
#[async_trait]
pub trait QaApi: Send + Sync {
    /// Extract text from an uploaded PDF and install it as the current document.
    async fn ingest_pdf(&self, file_name: &str, bytes: Bytes) -> Result<IngestOutcome, QaError>;

    /// Answer a question about the current document.
    async fn answer(&self, question: &str) -> Result<String, QaError>;
}

/// Fixed parameters sent with every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    /// Model identifier.
    pub model: String,
    /// Maximum tokens per answer.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Sequences that end generation.
    pub stop_sequences: Vec<String>,
    /// Leading document characters placed into the prompt.
    pub excerpt_chars: usize,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "command".into(),
            max_tokens: 300,
            temperature: 0.7,
            stop_sequences: vec!["\n".into()],
            excerpt_chars: DEFAULT_EXCERPT_CHARS,
        }
    }
}

impl GenerationSettings {
    /// Settings described by the runtime configuration.
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.cohere_model.clone(),
            max_tokens: config.generation_max_tokens,
            temperature: config.generation_temperature,
            excerpt_chars: config.context_excerpt_chars,
            ..Self::default()
        }
    }
}

/// Owns the document slot and the generation client.
///
/// Construct once at startup and share through an `Arc`; tests build one per case with a stub
/// client so no state leaks between them.
pub struct QaService {
    documents: DocumentStore,
    generation_client: Box<dyn GenerationClient>,
    settings: GenerationSettings,
    upload_dir: Option<PathBuf>,
}

impl QaService {
    /// Build a service around an explicit generation client.
    pub fn new(
        generation_client: Box<dyn GenerationClient>,
        settings: GenerationSettings,
        upload_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            documents: DocumentStore::new(),
            generation_client,
            settings,
            upload_dir,
        }
    }

    /// Build a service talking to the provider named in `config`.
    pub fn from_config(config: &Config) -> Self {
        tracing::info!(model = %config.cohere_model, "Initializing generation client");
        Self::new(
            get_generation_client(config),
            GenerationSettings::from_config(config),
            config.upload_tmp_dir.clone(),
        )
    }

    /// Read-only access to the document slot.
    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }
}

#[async_trait]
impl QaApi for QaService {
    async fn ingest_pdf(&self, file_name: &str, bytes: Bytes) -> Result<IngestOutcome, QaError> {
        if !is_pdf_file_name(file_name) {
            return Err(QaError::InvalidFileType);
        }

        let upload_dir = self.upload_dir.clone();
        let extracted =
            tokio::task::spawn_blocking(move || extract_pdf_text(&bytes, upload_dir.as_deref()))
                .await??;

        if extracted.text.trim().is_empty() {
            tracing::info!(file_name, pages = extracted.pages, "PDF contained no text");
            return Err(QaError::EmptyExtraction);
        }

        let outcome = IngestOutcome {
            pages: extracted.pages,
            characters: extracted.text.chars().count(),
        };
        self.documents.replace(extracted.text).await;
        tracing::info!(
            file_name,
            pages = outcome.pages,
            characters = outcome.characters,
            "Document replaced"
        );
        Ok(outcome)
    }

    async fn answer(&self, question: &str) -> Result<String, QaError> {
        let document = self.documents.snapshot().await;
        if document.is_empty() {
            return Err(QaError::NoDocument);
        }
        if question.trim().is_empty() {
            return Err(QaError::EmptyQuestion);
        }

        let prompt = build_prompt(&document, question, self.settings.excerpt_chars);
        let request = GenerationRequest {
            model: self.settings.model.clone(),
            prompt,
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            stop_sequences: self.settings.stop_sequences.clone(),
        };

        let candidates = self.generation_client.generate(request).await?;
        let answer = candidates
            .first()
            .map(|text| text.trim().to_string())
            .unwrap_or_default();
        if answer.is_empty() {
            return Err(QaError::EmptyAnswer);
        }

        tracing::debug!(answer_chars = answer.chars().count(), "Generated answer");
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::GenerationClientError;
    use crate::qa::ErrorKind;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingClient {
        reply: Vec<String>,
        prompts: Arc<Mutex<Vec<GenerationRequest>>>,
    }

    impl RecordingClient {
        fn replying(text: &str) -> Self {
            Self {
                reply: vec![text.to_string()],
                ..Self::default()
            }
        }

        fn requests(&self) -> Vec<GenerationRequest> {
            self.prompts.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl GenerationClient for RecordingClient {
        async fn generate(
            &self,
            request: GenerationRequest,
        ) -> Result<Vec<String>, GenerationClientError> {
            self.prompts.lock().expect("lock").push(request);
            Ok(self.reply.clone())
        }
    }

    struct FailingClient;

    #[async_trait]
    impl GenerationClient for FailingClient {
        async fn generate(
            &self,
            _request: GenerationRequest,
        ) -> Result<Vec<String>, GenerationClientError> {
            Err(GenerationClientError::ProviderUnavailable(
                "connection refused".into(),
            ))
        }
    }

    fn service_with(client: impl GenerationClient + 'static) -> QaService {
        QaService::new(Box::new(client), GenerationSettings::default(), None)
    }

    #[tokio::test]
    async fn question_without_document_is_a_precondition_failure() {
        let service = service_with(RecordingClient::replying("unused"));
        let error = service.answer("anything?").await.expect_err("no document");
        assert!(matches!(error, QaError::NoDocument));
        assert_eq!(error.kind(), ErrorKind::PreconditionFailure);
    }

    #[tokio::test]
    async fn no_document_is_checked_before_empty_question() {
        let service = service_with(RecordingClient::replying("unused"));
        let error = service.answer("   ").await.expect_err("no document");
        assert!(matches!(error, QaError::NoDocument));
    }

    #[tokio::test]
    async fn blank_question_is_invalid_input() {
        let client = RecordingClient::replying("unused");
        let service = service_with(client.clone());
        service.documents().replace("some text").await;

        let error = service.answer(" \n\t ").await.expect_err("blank question");
        assert!(matches!(error, QaError::EmptyQuestion));
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn answer_is_trimmed_and_request_uses_fixed_settings() {
        let client = RecordingClient::replying("  Hello World \n");
        let service = service_with(client.clone());
        service.documents().replace("Hello World").await;

        let answer = service
            .answer("What does the document say?")
            .await
            .expect("answer");
        assert_eq!(answer, "Hello World");

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.model, "command");
        assert_eq!(request.max_tokens, 300);
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.stop_sequences, vec!["\n".to_string()]);
        assert_eq!(
            request.prompt,
            "Context: Hello World\n\nQuestion: What does the document say?\n\nAnswer:"
        );
    }

    #[tokio::test]
    async fn prompt_uses_only_first_2000_characters() {
        let client = RecordingClient::replying("ok");
        let service = service_with(client.clone());
        let document = format!("{}{}", "x".repeat(2000), "SHOULD-NOT-APPEAR");
        service.documents().replace(document).await;

        service.answer("question").await.expect("answer");

        let prompt = &client.requests()[0].prompt;
        let excerpt = prompt
            .strip_prefix("Context: ")
            .and_then(|rest| rest.split("\n\nQuestion:").next())
            .expect("excerpt");
        assert_eq!(excerpt.chars().count(), 2000);
        assert!(!prompt.contains("SHOULD-NOT-APPEAR"));
    }

    #[tokio::test]
    async fn whitespace_answer_is_a_generation_failure() {
        let service = service_with(RecordingClient::replying(" \n "));
        service.documents().replace("text").await;

        let error = service.answer("q").await.expect_err("empty answer");
        assert!(matches!(error, QaError::EmptyAnswer));
        assert_eq!(error.kind(), ErrorKind::GenerationFailure);
    }

    #[tokio::test]
    async fn no_candidates_is_a_generation_failure() {
        let service = service_with(RecordingClient::default());
        service.documents().replace("text").await;

        let error = service.answer("q").await.expect_err("no candidates");
        assert!(matches!(error, QaError::EmptyAnswer));
    }

    #[tokio::test]
    async fn provider_errors_are_internal_failures_with_message() {
        let service = service_with(FailingClient);
        service.documents().replace("text").await;

        let error = service.answer("q").await.expect_err("provider down");
        assert_eq!(error.kind(), ErrorKind::InternalFailure);
        assert!(error.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn repeated_questions_give_the_same_answer() {
        let service = service_with(RecordingClient::replying("stable"));
        service.documents().replace("text").await;

        let first = service.answer("same?").await.expect("first");
        let second = service.answer("same?").await.expect("second");
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn non_pdf_name_leaves_document_untouched() {
        let service = service_with(RecordingClient::replying("unused"));
        service.documents().replace("previous").await;

        let error = service
            .ingest_pdf("notes.txt", Bytes::from_static(b"%PDF-1.4 whatever"))
            .await
            .expect_err("wrong suffix");
        assert!(matches!(error, QaError::InvalidFileType));
        assert_eq!(error.kind(), ErrorKind::InvalidInput);
        assert_eq!(&*service.documents().snapshot().await, "previous");
    }

    #[tokio::test]
    async fn unreadable_pdf_is_internal_and_keeps_previous_document() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = QaService::new(
            Box::new(RecordingClient::replying("unused")),
            GenerationSettings::default(),
            Some(dir.path().to_path_buf()),
        );
        service.documents().replace("previous").await;

        let error = service
            .ingest_pdf("broken.pdf", Bytes::from_static(b"garbage"))
            .await
            .expect_err("garbage pdf");
        assert_eq!(error.kind(), ErrorKind::InternalFailure);
        assert_eq!(&*service.documents().snapshot().await, "previous");
        assert_eq!(std::fs::read_dir(dir.path()).expect("dir").count(), 0);
    }
}
