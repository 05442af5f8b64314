use axum::{extract::Multipart, Json};
use serde::Serialize;
use tracing::info;

use crate::documents::upload::UploadForm;
use crate::documents::{extract_text, DocumentKind};
use crate::errors::AppError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractTextResponse {
    pub file_name: String,
    pub kind: DocumentKind,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_pages: Option<u32>,
}

/// POST /api/extract-text
///
/// Fills the pages' text areas from an uploaded file.
pub async fn handle_extract_text(multipart: Multipart) -> Result<Json<ExtractTextResponse>, AppError> {
    let mut form = UploadForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let extracted = extract_text(&file.file_name, file.content_type.as_deref(), file.bytes).await?;
    info!(
        file = %file.file_name,
        kind = ?extracted.kind,
        chars = extracted.text.chars().count(),
        "Extracted text from upload"
    );

    Ok(Json(ExtractTextResponse {
        file_name: file.file_name,
        kind: extracted.kind,
        text: extracted.text,
        num_pages: extracted.num_pages,
    }))
}
