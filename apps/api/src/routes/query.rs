use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::document::extract::{extract_pdf_blocking, looks_like_pdf, ExtractionError};
use crate::errors::AppError;
use crate::state::AppState;
use crate::upload::{parse_query_form, write_temp_pdf};

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub answer: String,
}

/// POST /query
/// Multipart `file` (PDF) + `question`. Answers one question about one document.
pub async fn handle_query(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<QueryResponse>, AppError> {
    let request_id = Uuid::new_v4();
    answer_query(state, multipart)
        .instrument(info_span!("query", %request_id))
        .await
        .map(Json)
}

async fn answer_query(state: AppState, multipart: Multipart) -> Result<QueryResponse, AppError> {
    let query = parse_query_form(multipart).await?.into_valid()?;

    if !looks_like_pdf(&query.pdf.data) {
        return Err(ExtractionError::NotAPdf.into());
    }

    info!(
        filename = query.pdf.filename.as_deref().unwrap_or("<unnamed>"),
        bytes = query.pdf.data.len(),
        question_chars = query.question.chars().count(),
        "query accepted"
    );

    // Removed on drop, so every early return below also cleans up.
    let temp = write_temp_pdf(&state.config.upload_dir, &query.pdf.data)?;
    let document = extract_pdf_blocking(temp.path().to_path_buf()).await?;
    if let Err(e) = temp.close() {
        warn!("failed to remove upload temp file: {e}");
    }

    if document.is_empty() {
        warn!("PDF contains no extractable text");
    }

    let answer = state.dispatcher.answer(&document.text, &query.question).await?;
    info!(
        tool = answer.invocation.as_ref().map_or("none", |record| record.tool),
        answer_chars = answer.text.len(),
        "query answered"
    );

    Ok(QueryResponse { answer: answer.text })
}
