//! Article endpoints: listing, reading, creating, favoriting.

use chrono::{DateTime, Utc};
use quillpost_core::{Endpoint, Method};
use serde::{Deserialize, Serialize};

// ============================================================================
// Wire Types
// ============================================================================

/// A published article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    /// Stable identifier, used in article paths.
    pub id: u64,
    /// Title.
    pub title: String,
    /// Full body, markdown.
    pub body: String,
    /// Author display name.
    pub author: String,
    /// Whether the requesting user has favorited this article.
    #[serde(default)]
    pub favorited: bool,
    /// Total favorite count.
    #[serde(default)]
    pub favorites_count: u64,
    /// Publication instant, RFC 3339.
    pub created_at: DateTime<Utc>,
}

/// Paged article listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleListResponse {
    /// The articles on this page.
    pub articles: Vec<Article>,
    /// Total matching articles across all pages.
    pub articles_count: u64,
}

/// Request body for creating an article.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateArticleRequest {
    /// Title.
    pub title: String,
    /// Full body, markdown.
    pub body: String,
}

// ============================================================================
// Endpoints
// ============================================================================

/// `GET /articles` - the public article feed.
pub fn list_articles() -> Endpoint<(), ArticleListResponse> {
    Endpoint::get("/articles")
}

/// `GET /articles/{id}` - a single article.
pub fn article(id: u64) -> Endpoint<(), Article> {
    Endpoint::get(format!("/articles/{id}"))
}

/// `POST /articles` - publishes a new article.
pub fn create_article() -> Endpoint<CreateArticleRequest, Article> {
    Endpoint::post("/articles").with_auth()
}

/// `POST /articles/{id}/favorite` - favorites an article.
///
/// Derived from [`article`] so the path stays in one place.
pub fn favorite(id: u64) -> Endpoint<(), Article> {
    article(id).derive(Method::Post, "/favorite").with_auth()
}

/// `DELETE /articles/{id}/favorite` - removes a favorite.
pub fn unfavorite(id: u64) -> Endpoint<(), Article> {
    article(id).derive(Method::Delete, "/favorite").with_auth()
}

// ============================================================================
// Tests
// ============================================================================
