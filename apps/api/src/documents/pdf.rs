use bytes::Bytes;
use tracing::debug;

use crate::documents::ExtractError;

/// Extracts the text and page count of a PDF.
///
/// Parsing is CPU-bound and the parser may panic on malformed input, so it
/// runs on the blocking pool where a panic surfaces as a `JoinError`.
pub async fn extract(bytes: Bytes) -> Result<(String, Option<u32>), ExtractError> {
    let size = bytes.len();
    let result = tokio::task::spawn_blocking(move || {
        let text = pdf_extract::extract_text_from_mem(&bytes)
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        let num_pages = lopdf::Document::load_mem(&bytes)
            .ok()
            .map(|doc| doc.get_pages().len() as u32);
        Ok::<_, ExtractError>((text, num_pages))
    })
    .await
    .map_err(|e| {
        debug!("PDF parser task failed: {e}");
        ExtractError::ParserCrashed
    })?;

    if let Ok((text, pages)) = &result {
        debug!(size, chars = text.len(), ?pages, "Extracted PDF text");
    }
    result
}
