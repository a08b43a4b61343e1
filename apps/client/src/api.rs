//! HTTP client for the backend's `POST /query`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum AskError {
    #[error("Cannot connect to backend at {0}. Is the API server running?")]
    Connection(String),

    #[error("The backend did not answer within {0} seconds")]
    Timeout(u64),

    /// Carries the server's `error` text as-is.
    #[error("{message}")]
    Server { status: u16, message: String },

    #[error("Unexpected response from backend: {0}")]
    Decode(String),

    #[error("Request failed: {0}")]
    Http(reqwest::Error),
}

#[derive(Debug, Error)]
pub enum PdfLoadError {
    #[error("{} is not a .pdf file", .0.display())]
    NotPdf(PathBuf),

    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A PDF picked by the user, held in memory and re-sent with every question.
#[derive(Debug, Clone)]
pub struct PdfUpload {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl PdfUpload {
    pub fn from_path(path: &Path) -> Result<Self, PdfLoadError> {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            return Err(PdfLoadError::NotPdf(path.to_path_buf()));
        }

        let data = std::fs::read(path).map_err(|source| PdfLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        Ok(Self { file_name, data })
    }
}

#[derive(Deserialize)]
struct AnswerBody {
    answer: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

pub struct BackendClient {
    client: Client,
    url: String,
    timeout_secs: u64,
}

impl BackendClient {
    pub fn new(url: impl Into<String>, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
            timeout_secs,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Sends the PDF and question, returning the backend's answer text.
    pub async fn ask(&self, pdf: &PdfUpload, question: &str) -> Result<String, AskError> {
        let part = Part::bytes(pdf.data.clone())
            .file_name(pdf.file_name.clone())
            .mime_str("application/pdf")
            .map_err(AskError::Http)?;
        let form = Form::new()
            .part("file", part)
            .text("question", question.to_string());

        debug!(url = %self.url, bytes = pdf.data.len(), "sending query");

        let response = self
            .client
            .post(&self.url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.send_error(e))?;
        parse_response(status, &body)
    }

    fn send_error(&self, e: reqwest::Error) -> AskError {
        if e.is_timeout() {
            AskError::Timeout(self.timeout_secs)
        } else if e.is_connect() {
            AskError::Connection(self.url.clone())
        } else {
            AskError::Http(e)
        }
    }
}

fn parse_response(status: StatusCode, body: &str) -> Result<String, AskError> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| "Backend error".to_string());
        return Err(AskError::Server {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str::<AnswerBody>(body)
        .map(|b| b.answer)
        .map_err(|e| AskError::Decode(e.to_string()))
}
