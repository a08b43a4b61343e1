//! Multipart intake for `POST /query` and the per-request temp file.

use std::io::Write;
use std::path::Path;

use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::errors::AppError;

pub const FILE_FIELD: &str = "file";
pub const QUESTION_FIELD: &str = "question";

#[derive(Debug, Clone)]
pub struct UploadedPdf {
    pub filename: Option<String>,
    pub data: Bytes,
}

/// The raw form as received. Either part may be missing.
#[derive(Debug, Default)]
pub struct QueryForm {
    pub file: Option<UploadedPdf>,
    pub question: Option<String>,
}

/// A form with both parts present and a non-blank question.
#[derive(Debug)]
pub struct ValidQuery {
    pub pdf: UploadedPdf,
    pub question: String,
}

impl QueryForm {
    pub fn into_valid(self) -> Result<ValidQuery, AppError> {
        let pdf = self
            .file
            .filter(|f| !f.data.is_empty())
            .ok_or_else(|| AppError::Validation("PDF file is required".to_string()))?;

        let question = self
            .question
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| AppError::Validation("Question is required".to_string()))?;

        Ok(ValidQuery { pdf, question })
    }
}

/// Reads every multipart field. Unknown fields are drained and ignored.
pub async fn parse_query_form(mut multipart: Multipart) -> Result<QueryForm, AppError> {
    let mut form = QueryForm::default();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        match field.name() {
            Some(FILE_FIELD) => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(multipart_error)?;
                debug!(filename = ?filename, bytes = data.len(), "received upload");
                form.file = Some(UploadedPdf { filename, data });
            }
            Some(QUESTION_FIELD) => {
                form.question = Some(field.text().await.map_err(multipart_error)?);
            }
            other => {
                debug!(field = ?other, "ignoring unknown multipart field");
                field.bytes().await.map_err(multipart_error)?;
            }
        }
    }

    Ok(form)
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(format!("Invalid multipart body: {}", e.body_text()))
    }
}

/// Writes the upload to a temp file in `dir`. The file is removed when the
/// returned handle drops.
pub fn write_temp_pdf(dir: &Path, data: &[u8]) -> Result<NamedTempFile, AppError> {
    let mut file = tempfile::Builder::new()
        .prefix("query-")
        .suffix(".pdf")
        .tempfile_in(dir)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("creating upload temp file")))?;
    file.write_all(data)
        .and_then(|_| file.flush())
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("writing upload temp file")))?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(data: &'static [u8]) -> Option<UploadedPdf> {
        Some(UploadedPdf {
            filename: Some("doc.pdf".into()),
            data: Bytes::from_static(data),
        })
    }

    #[test]
    fn test_missing_file_is_rejected() {
        let form = QueryForm {
            file: None,
            question: Some("What is this?".into()),
        };
        match form.into_valid() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "PDF file is required"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_file_is_rejected() {
        let form = QueryForm {
            file: pdf(b""),
            question: Some("What is this?".into()),
        };
        assert!(matches!(form.into_valid(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_blank_question_is_rejected() {
        let form = QueryForm {
            file: pdf(b"%PDF-1.4"),
            question: Some("   \n".into()),
        };
        match form.into_valid() {
            Err(AppError::Validation(msg)) => assert_eq!(msg, "Question is required"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_form_trims_question() {
        let form = QueryForm {
            file: pdf(b"%PDF-1.4"),
            question: Some("  Summarize it \n".into()),
        };
        let valid = form.into_valid().unwrap();
        assert_eq!(valid.question, "Summarize it");
        assert_eq!(valid.pdf.filename.as_deref(), Some("doc.pdf"));
    }

    #[test]
    fn test_temp_pdf_is_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let file = write_temp_pdf(dir.path(), b"%PDF-1.4 body").unwrap();
        let path = file.path().to_path_buf();

        assert!(path.starts_with(dir.path()));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 body");
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("query-") && name.ends_with(".pdf"));

        drop(file);
        assert!(!path.exists());
    }
}
