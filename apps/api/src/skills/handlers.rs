//! Axum route handler for the skill extraction API.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde_json::Value;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::skills::pdf_text::extract_text;
use crate::skills::scanner::{scan, SkillsResponse};
use crate::state::AppState;

/// POST /spacy_extract_skills
///
/// Body: `{"file_url": "<reference relative to the file host>"}`.
/// Pipeline: fetch → PDF text → scan. Any failure discards everything computed so far.
pub async fn handle_extract_skills(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<SkillsResponse>, AppError> {
    info!("Received skill extraction request");

    let Json(payload) = payload.map_err(|rejection| {
        warn!("Request is not JSON: {}", rejection.body_text());
        AppError::UnsupportedMediaType("Request content type must be application/json".to_string())
    })?;

    let file_ref = payload
        .get("file_url")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("No file URL received.".to_string()))?;
    info!("File URL: {file_ref}");

    let pdf = state.fetcher.fetch(file_ref).await?;
    let text = extract_text(pdf).await?;
    let report = scan(&text, state.recognizer.as_ref()).await?;

    info!("Skills extracted: {:?}", report.skills);
    info!("Emails extracted: {}", report.emails.join(", "));
    info!("Phone numbers extracted: {}", report.phones.join(", "));

    Ok(Json(report.into()))
}
