//! Blog: markdown posts with YAML front matter, loaded once at startup.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

pub mod handlers;
pub mod markdown;

use markdown::{reading_time_minutes, render_html, split_front_matter, PostError};

pub const POSTS_PER_PAGE: usize = 5;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub excerpt: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub content: String,
    pub html: String,
    pub reading_time_minutes: usize,
}

/// A post without its body, for listings.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub date: NaiveDate,
    pub excerpt: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub reading_time_minutes: usize,
}

impl From<&BlogPost> for PostSummary {
    fn from(post: &BlogPost) -> Self {
        Self {
            slug: post.slug.clone(),
            title: post.title.clone(),
            date: post.date,
            excerpt: post.excerpt.clone(),
            tags: post.tags.clone(),
            author: post.author.clone(),
            reading_time_minutes: post.reading_time_minutes,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPage {
    pub posts: Vec<PostSummary>,
    pub page: usize,
    pub total_pages: usize,
    pub total_posts: usize,
}

impl BlogPost {
    pub fn parse(slug: &str, source: &str) -> Result<Self, PostError> {
        let (front, body) = split_front_matter(source)?;
        Ok(Self {
            slug: slug.to_string(),
            title: front.title,
            date: front.date,
            excerpt: front.excerpt,
            tags: front.tags,
            author: front.author,
            html: render_html(body),
            reading_time_minutes: reading_time_minutes(body),
            content: body.to_string(),
        })
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self.excerpt.to_lowercase().contains(&query)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&query))
    }
}

/// All posts, newest first.
#[derive(Debug, Default)]
pub struct BlogIndex {
    posts: Vec<BlogPost>,
}

impl BlogIndex {
    pub fn new(mut posts: Vec<BlogPost>) -> Self {
        posts.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.slug.cmp(&b.slug)));
        Self { posts }
    }

    /// Loads every `*.md` file in `dir`. A missing directory is an empty blog;
    /// a post that fails to parse is skipped with a warning.
    pub fn load(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            info!("Blog directory {} not found, serving no posts", dir.display());
            return Ok(Self::default());
        }

        let mut posts = Vec::new();
        let entries = std::fs::read_dir(dir)
            .with_context(|| format!("Failed to read blog directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            let Some(slug) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let source = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            match BlogPost::parse(slug, &source) {
                Ok(post) => posts.push(post),
                Err(e) => warn!("Skipping blog post {}: {e}", path.display()),
            }
        }

        info!("Loaded {} blog posts from {}", posts.len(), dir.display());
        Ok(Self::new(posts))
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn get(&self, slug: &str) -> Option<&BlogPost> {
        self.posts.iter().find(|p| p.slug == slug)
    }

    /// One page of posts, optionally filtered by a case-insensitive query.
    /// Pages are 1-based; a page past the end is empty.
    pub fn page(&self, page: usize, query: Option<&str>) -> PostPage {
        let page = page.max(1);
        let matching: Vec<&BlogPost> = match query.map(str::trim).filter(|q| !q.is_empty()) {
            Some(q) => self.posts.iter().filter(|p| p.matches(q)).collect(),
            None => self.posts.iter().collect(),
        };

        let total_posts = matching.len();
        let posts = match (page - 1).checked_mul(POSTS_PER_PAGE) {
            Some(offset) => matching
                .into_iter()
                .skip(offset)
                .take(POSTS_PER_PAGE)
                .map(PostSummary::from)
                .collect(),
            None => Vec::new(),
        };

        PostPage {
            posts,
            page,
            total_pages: total_posts.div_ceil(POSTS_PER_PAGE),
            total_posts,
        }
    }
}
