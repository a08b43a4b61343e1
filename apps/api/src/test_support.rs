//! Fakes and fixtures shared by the inline test modules.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::Config;
use crate::dispatcher::{Dispatcher, ToolFailurePolicy};
use crate::embeddings::{Embedder, EmbeddingError};
use crate::llm_client::{AnswerGenerator, LlmError};
use crate::state::AppState;
use crate::tools::prompts::{
    GAP_ANALYSIS_HEADER, GAP_DETAILS_HEADER, GAP_EXPECTATIONS_HEADER, GAP_VERDICT_HEADER,
    NO_MAJOR_GAPS,
};
use crate::tools::ToolRegistry;

// ────────────────────────────────────────────────────────────────────────────
// Generator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct GeneratorCall {
    pub prompt: String,
    pub system: String,
}

type Script = dyn Fn(&str, &str) -> Result<String, LlmError> + Send + Sync;

/// Answers every call with a closure over `(prompt, system)` and records it.
pub struct ScriptedGenerator {
    script: Box<Script>,
    calls: Mutex<Vec<GeneratorCall>>,
}

impl ScriptedGenerator {
    pub fn new<F>(script: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, LlmError> + Send + Sync + 'static,
    {
        Self {
            script: Box::new(script),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<GeneratorCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str, system: &str) -> Result<String, LlmError> {
        self.calls.lock().unwrap().push(GeneratorCall {
            prompt: prompt.to_string(),
            system: system.to_string(),
        });
        (self.script)(prompt, system)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Embedders
// ────────────────────────────────────────────────────────────────────────────

/// Bag-of-words embedder: each lowercase word bumps one FNV-hashed bucket.
/// Texts sharing words score higher, which is all retrieval tests need.
pub struct HashingEmbedder {
    pub dimension: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self { dimension: 256 }
    }
}

impl HashingEmbedder {
    fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimension];
        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let bucket = fnv1a(&word.to_lowercase()) as usize % self.dimension;
            vector[bucket] += 1.0;
        }
        vector
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

#[async_trait]
impl Embedder for HashingEmbedder {
    fn batch_size(&self) -> usize {
        4
    }

    async fn embed(&self, inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(inputs.iter().map(|text| self.vector(text)).collect())
    }
}

/// Embedding service that is always down.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    fn batch_size(&self) -> usize {
        16
    }

    async fn embed(&self, _inputs: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Err(EmbeddingError::Api {
            status: 503,
            message: "embedding service unavailable".to_string(),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Fixtures
// ────────────────────────────────────────────────────────────────────────────

pub const SAMPLE_RESUME: &str = "Jane Doe
Profile Summary: Recent graduate interested in backend systems.
Technical Skills: Python, SQL, Git
Projects: Library management system (Flask, SQLite)
Education: B.Sc. Computer Science, 2024";

/// A well-formed gap report with every section and the given verdict.
pub fn gap_report(verdict: &str, gaps: &[&str]) -> String {
    let gap_lines = if gaps.is_empty() {
        NO_MAJOR_GAPS.to_string()
    } else {
        gaps.iter()
            .map(|g| format!("- {g}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Experience Level: Fresher\n\n\
         {GAP_DETAILS_HEADER}\nTechnical Skills:\nPython, SQL, Git\n\n\
         {GAP_EXPECTATIONS_HEADER}\n- REST APIs\n- Databases\n- Version control\n\n\
         {GAP_ANALYSIS_HEADER}\n{gap_lines}\n\n\
         {GAP_VERDICT_HEADER}\nThe resume is at fresher level.\n\
         Resume suitability for this role: {verdict}"
    )
}

/// Builds a one-page PDF with each line drawn in Helvetica, top to bottom.
pub fn minimal_pdf(lines: &[&str]) -> Vec<u8> {
    multi_page_pdf(&[lines])
}

/// Builds a PDF with one page per entry. A page with no lines has no text.
pub fn multi_page_pdf(pages: &[&[&str]]) -> Vec<u8> {
    // 1: catalog, 2: page tree, 3: font, then a (page, content) pair per page.
    let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + 2 * i).collect();
    let kids = page_ids
        .iter()
        .map(|id| format!("{id} 0 R"))
        .collect::<Vec<_>>()
        .join(" ");

    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{kids}] /Count {} >>", pages.len()),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_string(),
    ];
    for (lines, page_id) in pages.iter().zip(&page_ids) {
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            page_id + 1
        ));
        let content = page_content(lines);
        objects.push(format!(
            "<< /Length {} >>\nstream\n{}\nendstream",
            content.len(),
            content
        ));
    }

    let mut pdf = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::with_capacity(objects.len());
    for (i, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }

    let xref_offset = pdf.len();
    let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1);
    for offset in offsets {
        xref.push_str(&format!("{offset:010} 00000 n \n"));
    }
    pdf.extend_from_slice(xref.as_bytes());
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_offset
        )
        .as_bytes(),
    );
    pdf
}

fn page_content(lines: &[&str]) -> String {
    let mut content = String::from("BT\n/F1 12 Tf\n72 720 Td\n");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            content.push_str("0 -16 Td\n");
        }
        content.push_str(&format!("({}) Tj\n", escape_pdf_string(line)));
    }
    content.push_str("ET");
    content
}

fn escape_pdf_string(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            '\\' | '(' | ')' => vec!['\\', c],
            _ => vec![c],
        })
        .collect()
}

const BOUNDARY: &str = "pdf-agent-test-boundary";

/// Hand-built `multipart/form-data` body. Returns `(content_type, body)`.
pub fn multipart_body(question: Option<&str>, file: Option<(&str, &[u8])>) -> (String, Vec<u8>) {
    let mut body = Vec::new();

    if let Some(question) = question {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"question\"\r\n\r\n{question}\r\n"
            )
            .as_bytes(),
        );
    }

    if let Some((filename, data)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
                 Content-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    (format!("multipart/form-data; boundary={BOUNDARY}"), body)
}

pub fn test_config(upload_dir: &Path) -> Config {
    Config {
        openai_api_key: "test-key".to_string(),
        openai_base_url: "http://127.0.0.1:9".to_string(),
        port: 0,
        rust_log: "debug".to_string(),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 20 * 1024 * 1024,
        tool_failure_policy: ToolFailurePolicy::Disclose,
        llm_timeout_secs: 5,
    }
}

pub fn test_state(generator: Arc<ScriptedGenerator>, upload_dir: &Path) -> AppState {
    let config = test_config(upload_dir);
    let dispatcher = Dispatcher::new(
        Arc::new(ToolRegistry::standard()),
        generator,
        Arc::new(HashingEmbedder::default()),
        config.tool_failure_policy,
    );
    AppState {
        config,
        dispatcher: Arc::new(dispatcher),
    }
}
