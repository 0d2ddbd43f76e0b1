//! PDF → plain text.

use bytes::Bytes;
use tracing::debug;

use crate::errors::AppError;

/// Extracts the text of every page, concatenated in page order.
/// Parsing runs on the blocking pool; a parser panic becomes an extraction error.
pub async fn extract_text(pdf: Bytes) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || extract_text_blocking(&pdf))
        .await
        .map_err(|e| AppError::Extraction(format!("PDF extraction aborted: {e}")))?
}

/// Synchronous form of [`extract_text`]. Image-only pages contribute no text.
pub fn extract_text_blocking(pdf: &[u8]) -> Result<String, AppError> {
    let text = pdf_extract::extract_text_from_mem(pdf)
        .map_err(|e| AppError::Extraction(format!("Failed to extract text from PDF: {e}")))?;
    debug!("Extracted {} chars from {} byte PDF", text.len(), pdf.len());
    Ok(text)
}
