//! Uploaded-file to text extraction, shared by the resume analyzer,
//! the article reader and the standalone extract endpoint.

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

pub mod handlers;
pub mod pdf;
pub mod upload;

/// Number of characters kept in an article preview.
pub const PREVIEW_CHARS: usize = 500;
/// Preview shown when an upload could not be decoded.
pub const PREVIEW_FALLBACK: &str = "Could not extract text content";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("The uploaded file is empty")]
    Empty,

    #[error("PDF parsing failed: {0}")]
    Pdf(String),

    #[error("The PDF parser could not process this file")]
    ParserCrashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Pdf,
    Text,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub kind: DocumentKind,
    pub text: String,
    pub num_pages: Option<u32>,
}

/// A PDF is recognised by its extension or its declared content type.
pub fn is_pdf(file_name: &str, content_type: Option<&str>) -> bool {
    file_name.to_ascii_lowercase().ends_with(".pdf")
        || content_type.is_some_and(|ct| ct.eq_ignore_ascii_case("application/pdf"))
}

/// Decodes an upload: PDFs through the PDF parser, everything else as UTF-8.
pub async fn extract_text(
    file_name: &str,
    content_type: Option<&str>,
    bytes: Bytes,
) -> Result<ExtractedText, ExtractError> {
    if bytes.is_empty() {
        return Err(ExtractError::Empty);
    }

    if is_pdf(file_name, content_type) {
        let (text, num_pages) = pdf::extract(bytes).await?;
        return Ok(ExtractedText {
            kind: DocumentKind::Pdf,
            text,
            num_pages,
        });
    }

    Ok(ExtractedText {
        kind: DocumentKind::Text,
        text: String::from_utf8_lossy(&bytes).into_owned(),
        num_pages: None,
    })
}

/// First `PREVIEW_CHARS` characters followed by an ellipsis.
pub fn preview(text: &str) -> String {
    let cut = text
        .char_indices()
        .nth(PREVIEW_CHARS)
        .map(|(idx, _)| idx)
        .unwrap_or(text.len());
    format!("{}...", &text[..cut])
}
