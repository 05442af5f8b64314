//! In-memory article library: folders, articles and their comments.
//! All mutation goes through one lock, so readers never see a half-applied change.

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::errors::AppError;
use crate::reader::markers::{markers_for_page, Marker};
use crate::reader::models::{
    Article, Comment, Folder, StoredFile, DEFAULT_FOLDER_ID, DEFAULT_FOLDER_NAME,
};

/// An article about to be added to a folder.
#[derive(Debug)]
pub struct NewArticle {
    pub name: String,
    pub preview: String,
    pub text: String,
    pub num_pages: Option<u32>,
    pub file: StoredFile,
}

#[derive(Debug)]
pub struct Library {
    folders: RwLock<Vec<Folder>>,
}

impl Default for Library {
    fn default() -> Self {
        Self {
            folders: RwLock::new(vec![Folder::new(DEFAULT_FOLDER_ID, DEFAULT_FOLDER_NAME)]),
        }
    }
}

impl Library {
    pub async fn folders(&self) -> Vec<Folder> {
        self.folders.read().await.clone()
    }

    pub async fn folder_exists(&self, folder_id: &str) -> bool {
        self.folders.read().await.iter().any(|f| f.id == folder_id)
    }

    pub async fn create_folder(&self, name: &str) -> Result<Folder, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Folder name is required".to_string()));
        }

        let folder = Folder::new(Uuid::new_v4().to_string(), name);
        self.folders.write().await.push(folder.clone());
        Ok(folder)
    }

    pub async fn add_article(
        &self,
        folder_id: &str,
        new: NewArticle,
    ) -> Result<Article, AppError> {
        let mut folders = self.folders.write().await;
        let folder = folders
            .iter_mut()
            .find(|f| f.id == folder_id)
            .ok_or_else(|| AppError::NotFound(format!("Folder {folder_id} not found")))?;

        let article = Article {
            id: Uuid::new_v4(),
            name: new.name,
            content: new.preview,
            comments: Vec::new(),
            num_pages: new.num_pages,
            text: new.text,
            file: new.file,
        };
        folder.articles.push(article.clone());
        Ok(article)
    }

    pub async fn article(&self, article_id: Uuid) -> Result<Article, AppError> {
        self.folders
            .read()
            .await
            .iter()
            .flat_map(|f| f.articles.iter())
            .find(|a| a.id == article_id)
            .cloned()
            .ok_or_else(|| not_found(article_id))
    }

    pub async fn add_comment(&self, article_id: Uuid, comment: Comment) -> Result<Comment, AppError> {
        let mut folders = self.folders.write().await;
        let article = find_article_mut(&mut folders, article_id)?;
        article.comments.push(comment.clone());
        Ok(comment)
    }

    /// Replaces a comment's text in place. Returns false if the article or
    /// comment no longer exists.
    pub async fn update_comment_text(&self, article_id: Uuid, comment_id: Uuid, text: String) -> bool {
        let mut folders = self.folders.write().await;
        let Ok(article) = find_article_mut(&mut folders, article_id) else {
            return false;
        };
        match article.comments.iter_mut().find(|c| c.id == comment_id) {
            Some(comment) => {
                comment.text = text;
                true
            }
            None => false,
        }
    }

    pub async fn markers(&self, article_id: Uuid, page: u32) -> Result<Vec<Marker>, AppError> {
        let folders = self.folders.read().await;
        let article = folders
            .iter()
            .flat_map(|f| f.articles.iter())
            .find(|a| a.id == article_id)
            .ok_or_else(|| not_found(article_id))?;
        Ok(markers_for_page(&article.comments, page))
    }
}

fn find_article_mut(folders: &mut [Folder], article_id: Uuid) -> Result<&mut Article, AppError> {
    folders
        .iter_mut()
        .flat_map(|f| f.articles.iter_mut())
        .find(|a| a.id == article_id)
        .ok_or_else(|| not_found(article_id))
}

fn not_found(article_id: Uuid) -> AppError {
    AppError::NotFound(format!("Article {article_id} not found"))
}
