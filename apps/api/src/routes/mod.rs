pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::blog::handlers as blog;
use crate::chat::handlers as chat;
use crate::documents::handlers as documents;
use crate::humanize::handlers as humanize;
use crate::reader::handlers as reader;
use crate::resume::handlers as resume;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/health", get(health::health_handler))
        // Homework helper chat
        .route("/api/chat", post(chat::handle_chat))
        // Humanizer
        .route("/api/humanize", post(humanize::handle_humanize))
        .route("/api/humanize/history", get(humanize::handle_history))
        .route("/api/humanize/usage", get(humanize::handle_usage))
        // Resume analyzer
        .route("/api/resume-analysis", post(resume::handle_analyze))
        .route("/api/resume-analysis/report", post(resume::handle_report))
        // Document text extraction
        .route("/api/extract-text", post(documents::handle_extract_text))
        // Article reader
        .route(
            "/api/reader/folders",
            get(reader::handle_list_folders).post(reader::handle_create_folder),
        )
        .route(
            "/api/reader/folders/:folder_id/articles",
            post(reader::handle_upload_article),
        )
        .route(
            "/api/reader/articles/:article_id",
            get(reader::handle_get_article),
        )
        .route(
            "/api/reader/articles/:article_id/file",
            get(reader::handle_get_article_file),
        )
        .route(
            "/api/reader/articles/:article_id/comments",
            post(reader::handle_add_comment),
        )
        .route(
            "/api/reader/articles/:article_id/pages/:page/markers",
            get(reader::handle_page_markers),
        )
        // Blog
        .route("/api/blog/posts", get(blog::handle_list_posts))
        .route("/api/blog/posts/:slug", get(blog::handle_get_post))
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
