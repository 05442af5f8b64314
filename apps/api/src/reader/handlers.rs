//! Axum route handlers for the Article Reader API.

use std::sync::Arc;

use anyhow::anyhow;
use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::documents::upload::UploadForm;
use crate::documents::{extract_text, is_pdf, preview, PREVIEW_FALLBACK};
use crate::errors::AppError;
use crate::llm_client::{ChatMessage, CompletionRequest, LlmClient, ModelId};
use crate::reader::markers::{anchor_from_selection, Marker};
use crate::reader::models::{Article, Comment, Folder, Position, Rect, StoredFile};
use crate::reader::prompts::{annotation_prompt, ARTICLE_ANALYST_SYSTEM};
use crate::reader::store::{Library, NewArticle};
use crate::state::AppState;

pub const SELECTION_PLACEHOLDER: &str = "Analyzing...";
pub const ARTICLE_PLACEHOLDER: &str = "Analyzing article...";
pub const AI_FAILURE_NOTE: &str = "AI analysis failed. Please try again.";

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub text: String,
    #[serde(default, rename = "isAI", alias = "isAi")]
    pub is_ai: bool,
    pub position: Option<Position>,
    pub selection_rect: Option<Rect>,
    pub container_rect: Option<Rect>,
    pub page_number: Option<u32>,
    pub selected_text: Option<String>,
}

impl CommentRequest {
    /// Explicit position wins; otherwise derived from the selection rectangles.
    fn anchor(&self) -> Option<Position> {
        self.position.or_else(|| match (&self.selection_rect, &self.container_rect) {
            (Some(selection), Some(container)) => Some(anchor_from_selection(selection, container)),
            _ => None,
        })
    }

    fn selection(&self) -> Option<String> {
        self.selected_text
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/reader/folders
pub async fn handle_list_folders(State(state): State<AppState>) -> Json<Vec<Folder>> {
    Json(state.library.folders().await)
}

/// POST /api/reader/folders
pub async fn handle_create_folder(
    State(state): State<AppState>,
    Json(request): Json<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Folder>), AppError> {
    let folder = state.library.create_folder(&request.name).await?;
    info!(folder_id = %folder.id, name = %folder.name, "Folder created");
    Ok((StatusCode::CREATED, Json(folder)))
}

/// POST /api/reader/folders/:folder_id/articles
///
/// Multipart form with a `file` part. A file whose text cannot be extracted
/// is still stored, with a fallback preview.
pub async fn handle_upload_article(
    State(state): State<AppState>,
    Path(folder_id): Path<String>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Article>), AppError> {
    if !state.library.folder_exists(&folder_id).await {
        return Err(AppError::NotFound(format!("Folder {folder_id} not found")));
    }

    let mut form = UploadForm::read(multipart).await?;
    let file = form
        .take_file("file")
        .ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    let content_type = file.content_type.clone().unwrap_or_else(|| {
        if is_pdf(&file.file_name, None) {
            "application/pdf".to_string()
        } else {
            "application/octet-stream".to_string()
        }
    });

    let (preview_text, text, num_pages) =
        match extract_text(&file.file_name, file.content_type.as_deref(), file.bytes.clone()).await {
            Ok(extracted) => (preview(&extracted.text), extracted.text, extracted.num_pages),
            Err(e) => {
                warn!(file = %file.file_name, "Could not extract article text: {e}");
                (PREVIEW_FALLBACK.to_string(), String::new(), None)
            }
        };

    let article = state
        .library
        .add_article(
            &folder_id,
            NewArticle {
                name: file.file_name,
                preview: preview_text,
                text,
                num_pages,
                file: StoredFile {
                    content_type,
                    bytes: file.bytes,
                },
            },
        )
        .await?;

    info!(folder_id = %folder_id, article_id = %article.id, name = %article.name, "Article uploaded");
    Ok((StatusCode::CREATED, Json(article)))
}

/// GET /api/reader/articles/:article_id
pub async fn handle_get_article(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<Json<Article>, AppError> {
    Ok(Json(state.library.article(article_id).await?))
}

/// GET /api/reader/articles/:article_id/file
pub async fn handle_get_article_file(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let article = state.library.article(article_id).await?;
    let disposition = format!(
        "inline; filename=\"{}\"",
        article.name.replace(&['"', '\\'][..], "_")
    );

    Ok((
        [
            (header::CONTENT_TYPE, article.file.content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        article.file.bytes,
    )
        .into_response())
}

/// POST /api/reader/articles/:article_id/comments
///
/// Human comments are stored as sent. AI comments are stored with a
/// placeholder and filled in by a background LLM call.
pub async fn handle_add_comment(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let selection = request.selection();
    let position = request.anchor();
    let page_number = request.page_number.or(position.map(|_| 1));

    let text = if request.is_ai {
        if selection.is_some() {
            SELECTION_PLACEHOLDER
        } else {
            ARTICLE_PLACEHOLDER
        }
        .to_string()
    } else {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(AppError::Validation("Comment text is required".to_string()));
        }
        text.to_string()
    };

    let comment = Comment {
        id: Uuid::new_v4(),
        text,
        is_ai: request.is_ai,
        timestamp: Utc::now(),
        position,
        page_number,
        selected_text: selection,
    };
    let model = if request.is_ai {
        Some(ModelId::parse(&state.config.reader_model).map_err(|e| AppError::Internal(anyhow!(e)))?)
    } else {
        None
    };
    let comment = state.library.add_comment(article_id, comment).await?;

    if let Some(model) = model {
        let article = state.library.article(article_id).await?;
        tokio::spawn(annotate(
            state.llm.clone(),
            state.library.clone(),
            model,
            article,
            comment.clone(),
        ));
    }

    Ok((StatusCode::CREATED, Json(comment)))
}

/// GET /api/reader/articles/:article_id/pages/:page/markers
pub async fn handle_page_markers(
    State(state): State<AppState>,
    Path((article_id, page)): Path<(Uuid, u32)>,
) -> Result<Json<Vec<Marker>>, AppError> {
    Ok(Json(state.library.markers(article_id, page).await?))
}

/// Replaces an AI comment's placeholder with the model's analysis.
async fn annotate(
    llm: LlmClient,
    library: Arc<Library>,
    model: ModelId,
    article: Article,
    comment: Comment,
) {
    let request = CompletionRequest::new(
        model,
        ARTICLE_ANALYST_SYSTEM,
        vec![ChatMessage::user(annotation_prompt(
            &article.name,
            &article.text,
            comment.selected_text.as_deref(),
        ))],
    );

    let text = match llm.complete(&request).await {
        Ok(completion) if !completion.text.trim().is_empty() => completion.text.trim().to_string(),
        Ok(_) => {
            warn!(article_id = %article.id, comment_id = %comment.id, "AI comment came back empty");
            AI_FAILURE_NOTE.to_string()
        }
        Err(e) => {
            warn!(article_id = %article.id, comment_id = %comment.id, "AI comment failed: {e}");
            AI_FAILURE_NOTE.to_string()
        }
    };

    if library.update_comment_text(article.id, comment.id, text).await {
        info!(article_id = %article.id, comment_id = %comment.id, "AI comment ready");
    }
}
