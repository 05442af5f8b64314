use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::blog::{BlogPost, PostPage};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Kept as text so a non-numeric page falls back to the first page.
    pub page: Option<String>,
    pub q: Option<String>,
}

/// GET /api/blog/posts?page=N&q=search
pub async fn handle_list_posts(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Json<PostPage> {
    let page = query
        .page
        .as_deref()
        .and_then(|p| p.trim().parse::<usize>().ok())
        .unwrap_or(1);
    Json(state.blog.page(page, query.q.as_deref()))
}

/// GET /api/blog/posts/:slug
pub async fn handle_get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<BlogPost>, AppError> {
    state
        .blog
        .get(&slug)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Post '{slug}' not found")))
}

#[cfg(test)]
mod tests {
    use crate::blog::test_support::post_source;
    use crate::blog::{BlogIndex, BlogPost};
    use crate::state::test_support::app_with_blog;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::MockServer;

    fn blog() -> BlogIndex {
        BlogIndex::new(
            (1..=7)
                .map(|i| {
                    BlogPost::parse(
                        &format!("post-{i}"),
                        &post_source(&format!("Post {i}"), &format!("2024-06-0{i}"), &["notes"]),
                    )
                    .unwrap()
                })
                .collect(),
        )
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_list_pages() {
        let server = MockServer::start().await;
        let app = app_with_blog(&server, blog());

        let (status, json) = get_json(app.clone(), "/api/blog/posts").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["page"], 1);
        assert_eq!(json["totalPages"], 2);
        assert_eq!(json["posts"].as_array().unwrap().len(), 5);
        assert_eq!(json["posts"][0]["slug"], "post-7");
        assert!(json["posts"][0].get("html").is_none());

        let (_, json) = get_json(app.clone(), "/api/blog/posts?page=2").await;
        assert_eq!(json["posts"].as_array().unwrap().len(), 2);

        let (_, json) = get_json(app.clone(), "/api/blog/posts?page=abc").await;
        assert_eq!(json["page"], 1);

        let (_, json) = get_json(app, "/api/blog/posts?page=9").await;
        assert!(json["posts"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_and_slug_lookup() {
        let server = MockServer::start().await;
        let app = app_with_blog(&server, blog());

        let (_, json) = get_json(app.clone(), "/api/blog/posts?q=post%203").await;
        assert_eq!(json["totalPosts"], 1);
        assert_eq!(json["posts"][0]["slug"], "post-3");

        let (status, json) = get_json(app.clone(), "/api/blog/posts/post-3").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["title"], "Post 3");
        assert!(json["html"].as_str().unwrap().contains("<p>Body of Post 3.</p>"));

        let (status, json) = get_json(app, "/api/blog/posts/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }
}
