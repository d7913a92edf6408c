//! Helpers shared by the integration tests.

#![allow(dead_code)]

use pdfqa::generation::{GenerationClient, GenerationClientError, GenerationRequest};
use std::sync::{Arc, Mutex};

/// Build a minimal PDF with one page per entry, each drawing its text in Helvetica.
///
/// Empty entries produce pages with an empty content stream.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let font_id = 3;
    let first_page_id = 4;
    let kids: Vec<String> = (0..pages.len())
        .map(|index| format!("{} 0 R", first_page_id + index * 2))
        .collect();

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        ),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (index, text) in pages.iter().enumerate() {
        let content_id = first_page_id + index * 2 + 1;
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 {font_id} 0 R >> >> /Contents {content_id} 0 R >>"
        ));
        let stream = if text.is_empty() {
            String::new()
        } else {
            format!("BT /F1 24 Tf 72 720 Td ({}) Tj ET", escape(text))
        };
        objects.push(format!(
            "<< /Length {} >>\nstream\n{stream}\nendstream",
            stream.len()
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (index, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
    }

    let xref_offset = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    out.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    out
}

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('(', "\\(")
        .replace(')', "\\)")
}

/// Generation stub that answers with a fixed text and records every request.
#[derive(Clone, Default)]
pub struct EchoClient {
    reply: String,
    requests: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl EchoClient {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().expect("lock").clone()
    }
}

#[async_trait::async_trait]
impl GenerationClient for EchoClient {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<Vec<String>, GenerationClientError> {
        self.requests.lock().expect("lock").push(request);
        Ok(vec![self.reply.clone()])
    }
}

/// Number of entries left in `dir`.
pub fn leftover_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).expect("read dir").count()
}
